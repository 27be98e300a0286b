//! Local text embeddings via fastembed / ONNX Runtime.
//!
//! The model is downloaded on first use into the cache directory and
//! loaded once per process. All vectors that will ever be compared must
//! come from the same model; the model name is part of the configuration
//! and must stay fixed for the lifetime of a database.

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex};
use tokio::task;
use tracing::{debug, info};
use whosaid_core::{EmbeddingConfig, EmbeddingError, TextEmbedder};

/// Output width for a supported model name, if we know it.
pub fn model_dimensions(model_name: &str) -> Option<usize> {
    match model_name {
        "all-MiniLM-L6-v2" => Some(384),
        "all-MiniLM-L12-v2" => Some(384),
        "bge-small-en-v1.5" => Some(384),
        "bge-base-en-v1.5" => Some(768),
        "bge-large-en-v1.5" => Some(1024),
        "nomic-embed-text-v1" => Some(768),
        "nomic-embed-text-v1.5" => Some(768),
        _ => None,
    }
}

fn model_name_to_enum(model_name: &str) -> Result<EmbeddingModel, EmbeddingError> {
    match model_name {
        "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "all-MiniLM-L12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(EmbeddingModel::BGELargeENV15),
        "nomic-embed-text-v1" => Ok(EmbeddingModel::NomicEmbedTextV1),
        "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
        _ => Err(EmbeddingError::ModelNotSupported {
            model_name: model_name.to_string(),
        }),
    }
}

/// [`TextEmbedder`] backed by a locally-run fastembed model.
pub struct LocalEmbedder {
    // fastembed's embed takes &mut self; the mutex gives shared handles
    // interior mutability across engine and classifier.
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimensions: usize,
}

impl LocalEmbedder {
    /// Load (downloading on first use) the configured model. May take
    /// tens of seconds on a cold cache.
    pub async fn load(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let embedding_model = model_name_to_enum(&config.model)?;
        let dimensions = model_dimensions(&config.model).ok_or_else(|| {
            EmbeddingError::ModelNotSupported {
                model_name: config.model.clone(),
            }
        })?;

        info!(
            "Loading embedding model {} ({} dimensions)",
            config.model, dimensions
        );

        let mut init_options = InitOptions::default();
        init_options.model_name = embedding_model;
        init_options.show_download_progress = config.show_download_progress;
        if let Some(cache_dir) = &config.cache_dir {
            init_options.cache_dir = cache_dir.clone();
        }

        let model_name = config.model.clone();
        let model = task::spawn_blocking(move || TextEmbedding::try_new(init_options))
            .await
            .map_err(|e| EmbeddingError::ModelLoadingFailed {
                model_name: model_name.clone(),
                reason: format!("task join error: {e}"),
            })?
            .map_err(|e| EmbeddingError::ModelLoadingFailed {
                model_name: model_name.clone(),
                reason: e.to_string(),
            })?;

        info!("Embedding model {} ready", model_name);

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name,
            dimensions,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl TextEmbedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let model = Arc::clone(&self.model);
        let input = vec![text.to_string()];

        // fastembed is synchronous; run inference off the async runtime.
        let embeddings = task::spawn_blocking(move || {
            let mut guard = model
                .lock()
                .map_err(|e| format!("model mutex poisoned: {e}"))?;
            guard.embed(input, None).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| EmbeddingError::InferenceFailed {
            reason: format!("task join error: {e}"),
        })?
        .map_err(|reason| EmbeddingError::InferenceFailed { reason })?;

        let embedding = embeddings.into_iter().next().ok_or_else(|| {
            EmbeddingError::InferenceFailed {
                reason: "model returned no embedding".to_string(),
            }
        })?;

        if embedding.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        debug!(
            "Embedded {} chars into {} dimensions",
            text.chars().count(),
            embedding.len()
        );
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
