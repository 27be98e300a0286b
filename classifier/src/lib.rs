//! Pairwise authorship classification.
//!
//! Given two synced users and a probe text, fit a fresh binary linear
//! classifier over their stored post embeddings and report which user
//! the probe reads most like. Models are throwaway: one per call,
//! nothing cached, nothing persisted, no store writes.

pub mod dataset;
pub mod logistic;

pub use dataset::TrainingSet;
pub use logistic::{FitConfig, LogisticModel};

use ndarray::Array1;
use std::sync::Arc;
use tracing::{debug, info};
use whosaid_core::{ClassifierError, Store, TextEmbedder, User};

#[cfg(test)]
mod tests;

/// Minimum stored posts per compared user. One is enough to fit at all;
/// raising this would trade coverage for model quality.
pub const MIN_POSTS_PER_USER: usize = 1;

/// The answer: which handle more likely wrote the probe. A binary
/// decision with no confidence score attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub predicted: String,
}

pub struct PairwiseClassifier {
    store: Arc<dyn Store>,
    embedder: Arc<dyn TextEmbedder>,
    fit_config: FitConfig,
}

impl PairwiseClassifier {
    pub fn new(store: Arc<dyn Store>, embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            store,
            embedder,
            fit_config: FitConfig::default(),
        }
    }

    /// Decide whether `handle_a` or `handle_b` more likely authored
    /// `probe_text`. Label 0 is always the first argument and label 1
    /// the second; any ordering convention (the UI sorts pairs
    /// lexicographically) belongs to the caller.
    pub async fn compare(
        &self,
        handle_a: &str,
        handle_b: &str,
        probe_text: &str,
    ) -> Result<Prediction, ClassifierError> {
        if handle_a == handle_b {
            return Err(ClassifierError::SameUser {
                handle: handle_a.to_string(),
            });
        }

        let user_a = self.resolve(handle_a).await?;
        let user_b = self.resolve(handle_b).await?;

        let a_vectors = self.embeddings_for(&user_a).await?;
        let b_vectors = self.embeddings_for(&user_b).await?;
        debug!(
            "Training on {} posts from {} and {} from {}",
            a_vectors.len(),
            handle_a,
            b_vectors.len(),
            handle_b
        );

        let training = TrainingSet::assemble(&a_vectors, &b_vectors)?;
        let model = LogisticModel::fit(&training.features, &training.labels, &self.fit_config);

        let probe = self.embedder.embed(probe_text).await?;
        if probe.len() != training.features.ncols() {
            return Err(ClassifierError::DimensionMismatch {
                expected: training.features.ncols(),
                actual: probe.len(),
            });
        }
        let probe = Array1::from(probe);

        let predicted = match model.predict(&probe) {
            0 => handle_a,
            _ => handle_b,
        };
        info!(
            "Compared {} vs {}: probe attributed to {}",
            handle_a, handle_b, predicted
        );
        Ok(Prediction {
            predicted: predicted.to_string(),
        })
    }

    async fn resolve(&self, handle: &str) -> Result<User, ClassifierError> {
        self.store
            .get_user_by_handle(handle)
            .await?
            .ok_or_else(|| ClassifierError::UnknownUser {
                handle: handle.to_string(),
            })
    }

    async fn embeddings_for(&self, user: &User) -> Result<Vec<Vec<f32>>, ClassifierError> {
        let posts = self.store.posts_for_user(user.id).await?;
        if posts.len() < MIN_POSTS_PER_USER {
            return Err(ClassifierError::InsufficientData {
                handle: user.handle.clone(),
            });
        }
        Ok(posts.into_iter().map(|p| p.embedding).collect())
    }
}
