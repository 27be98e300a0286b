use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const DEFAULT_CONFIG_FILE: &str = "whosaid.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Base URL of the remote feed service.
    #[serde(default = "default_feed_url")]
    pub base_url: String,
    /// Optional bearer token sent with every feed request.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Maximum posts requested per timeline fetch.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model name; must stay fixed for the lifetime of a
    /// database, since vectors from different models never compare.
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Where downloaded model files are cached.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub show_download_progress: bool,
}

fn default_feed_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_page_size() -> u32 {
    200
}

fn default_user_agent() -> String {
    format!("whosaid/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_database_url() -> String {
    "sqlite://whosaid.db".to_string()
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_feed_url(),
            api_token: None,
            page_size: default_page_size(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
            show_download_progress: false,
        }
    }
}

impl AppConfig {
    /// Load configuration. An explicit path must exist; without one the
    /// default file is used when present, built-in defaults otherwise.
    /// Environment variables override file values either way.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::FileNotFound {
                        path: p.display().to_string(),
                    });
                }
                Self::from_file(p)?
            }
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("WHOSAID_FEED_URL") {
            self.feed.base_url = value;
        }
        if let Ok(value) = std::env::var("WHOSAID_FEED_TOKEN") {
            self.feed.api_token = Some(value);
        }
        if let Ok(value) = std::env::var("WHOSAID_DATABASE_URL") {
            self.database.url = value;
        }
        if let Ok(value) = std::env::var("WHOSAID_EMBEDDING_MODEL") {
            self.embedding.model = value;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.feed.base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "feed.base_url".to_string(),
                value: self.feed.base_url.clone(),
            });
        }
        if self.feed.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "feed.page_size".to_string(),
                value: self.feed.page_size.to_string(),
            });
        }
        if self.embedding.model.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "embedding.model".to_string(),
                value: self.embedding.model.clone(),
            });
        }
        Ok(())
    }
}
