use clap::{Parser, Subcommand};
use classifier::PairwiseClassifier;
use database::SqliteStore;
use embedding_engine::{model_dimensions, LocalEmbedder};
use feed_client::FeedApiClient;
use std::path::PathBuf;
use std::sync::Arc;
use sync_engine::SyncEngine;
use tracing_subscriber::EnvFilter;
use whosaid_core::{AppConfig, CoreError, EmbeddingError, ErrorExt, Store};

#[derive(Parser)]
#[command(
    name = "whosaid",
    version,
    about = "Sync feed timelines and guess who wrote a text"
)]
struct Cli {
    /// Path to the configuration file (default: whosaid.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pull new posts for a handle and embed them into the store
    Sync { handle: String },
    /// Predict which of two users more likely wrote the text
    Compare {
        handle_a: String,
        handle_b: String,
        text: String,
    },
    /// List synced users
    Users,
    /// Drop and recreate the local store
    Reset {
        /// Confirm deletion of all stored users and posts
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_env("WHOSAID_LOG")
        .unwrap_or_else(|_| EnvFilter::new("whosaid=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        error.log_error();
        eprintln!("Error: {}", error.user_friendly_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Sync { handle } => {
            let store = connect_store(&config).await?;
            let source = Arc::new(FeedApiClient::new(&config.feed)?);
            let embedder = Arc::new(LocalEmbedder::load(&config.embedding).await?);
            let engine = SyncEngine::new(store, source, embedder);

            let report = engine.sync(&handle).await?;
            println!(
                "Synced @{}: {} new posts ({} fetched, {} already stored, {} embedding failures), cursor {}",
                report.handle,
                report.ingested,
                report.fetched,
                report.skipped,
                report.embed_failures,
                report
                    .cursor
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            );
        }

        Command::Compare {
            handle_a,
            handle_b,
            text,
        } => {
            let store = connect_store(&config).await?;
            let embedder = Arc::new(LocalEmbedder::load(&config.embedding).await?);
            let classifier = PairwiseClassifier::new(store, embedder);

            // Caller-side convention: the pair is compared in
            // lexicographic order so repeated queries phrase the same
            // matchup the same way.
            let (first, second) = if handle_a <= handle_b {
                (handle_a, handle_b)
            } else {
                (handle_b, handle_a)
            };

            let prediction = classifier.compare(&first, &second, &text).await?;
            println!("@{} is more likely to have written that", prediction.predicted);
        }

        Command::Users => {
            let store = connect_store(&config).await?;
            let users = store.list_users().await?;
            if users.is_empty() {
                println!("No users synced yet");
            }
            for user in users {
                let posts = store.post_count_for_user(user.id).await?;
                let cursor = user
                    .newest_post_id
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "never synced".to_string());
                println!("@{:<24} {:>5} posts  cursor {}", user.handle, posts, cursor);
            }
        }

        Command::Reset { yes } => {
            if !yes {
                eprintln!(
                    "This deletes all stored users and posts. Re-run with --yes to confirm."
                );
                return Ok(());
            }
            let store = connect_store(&config).await?;
            store.reset().await?;
            println!("Store reset");
        }
    }

    Ok(())
}

async fn connect_store(config: &AppConfig) -> Result<Arc<SqliteStore>, CoreError> {
    let dimensions = model_dimensions(&config.embedding.model).ok_or_else(|| {
        EmbeddingError::ModelNotSupported {
            model_name: config.embedding.model.clone(),
        }
    })?;
    let store = SqliteStore::connect(&config.database.url, dimensions).await?;
    store.run_migrations().await?;
    Ok(Arc::new(store))
}
