use crate::{PairwiseClassifier, Prediction};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use whosaid_core::{
    ClassifierError, EmbeddingError, Post, Store, StoreError, TextEmbedder, User,
};

/// Read-only store fake that counts how often it is touched.
#[derive(Default)]
struct MemoryStore {
    users: HashMap<String, User>,
    posts: HashMap<i64, Vec<Post>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    fn with_user(mut self, id: i64, handle: &str, embeddings: Vec<Vec<f32>>) -> Self {
        self.users.insert(
            handle.to_string(),
            User {
                id,
                handle: handle.to_string(),
                newest_post_id: None,
            },
        );
        let posts = embeddings
            .into_iter()
            .enumerate()
            .map(|(i, embedding)| Post {
                id: id * 100 + i as i64,
                user_id: id,
                text: format!("post {i}"),
                embedding,
            })
            .collect();
        self.posts.insert(id, posts);
        self
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user_by_handle(&self, handle: &str) -> Result<Option<User>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.get(handle).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.values().cloned().collect())
    }

    async fn posts_for_user(&self, user_id: i64) -> Result<Vec<Post>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.posts.get(&user_id).cloned().unwrap_or_default())
    }

    async fn post_exists(&self, post_id: i64) -> Result<bool, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.posts.values().flatten().any(|p| p.id == post_id))
    }

    async fn commit_sync(
        &self,
        _user: &User,
        _cursor: Option<i64>,
        _posts: &[Post],
    ) -> Result<(), StoreError> {
        panic!("the classifier must never write to the store");
    }
}

/// Embedder fake returning one fixed vector for every probe.
struct StaticEmbedder {
    vector: Option<Vec<f32>>,
    dims: usize,
}

impl StaticEmbedder {
    fn returning(vector: Vec<f32>) -> Self {
        let dims = vector.len();
        Self {
            vector: Some(vector),
            dims,
        }
    }

    fn failing(dims: usize) -> Self {
        Self { vector: None, dims }
    }
}

#[async_trait]
impl TextEmbedder for StaticEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.vector
            .clone()
            .ok_or_else(|| EmbeddingError::InferenceFailed {
                reason: "scripted failure".to_string(),
            })
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

fn near(axis: usize, jitter: f32) -> Vec<f32> {
    let mut v = vec![0.0; 4];
    v[axis] = 1.0 - jitter;
    v[(axis + 1) % 4] = jitter;
    v
}

/// Alice's posts cluster near e1, Bob's near e2.
fn clustered_store() -> MemoryStore {
    MemoryStore::default()
        .with_user(1, "alice", vec![near(0, 0.0), near(0, 0.1)])
        .with_user(2, "bob", vec![near(1, 0.0), near(1, 0.1)])
}

fn classifier(store: MemoryStore, embedder: StaticEmbedder) -> (Arc<MemoryStore>, PairwiseClassifier) {
    let store = Arc::new(store);
    let classifier = PairwiseClassifier::new(store.clone(), Arc::new(embedder));
    (store, classifier)
}

#[tokio::test]
async fn self_comparison_is_rejected_before_any_work() {
    let (store, classifier) = classifier(
        clustered_store(),
        StaticEmbedder::returning(vec![0.9, 0.1, 0.0, 0.0]),
    );

    let result = classifier.compare("alice", "alice", "anything").await;

    assert!(matches!(
        result,
        Err(ClassifierError::SameUser { handle }) if handle == "alice"
    ));
    assert_eq!(store.reads(), 0);
}

#[tokio::test]
async fn unknown_user_names_the_handle() {
    let (_, classifier) = classifier(
        clustered_store(),
        StaticEmbedder::returning(vec![0.9, 0.1, 0.0, 0.0]),
    );

    let result = classifier.compare("alice", "carol", "anything").await;

    assert!(matches!(
        result,
        Err(ClassifierError::UnknownUser { handle }) if handle == "carol"
    ));
}

#[tokio::test]
async fn user_without_posts_is_insufficient_data() {
    let store = MemoryStore::default()
        .with_user(1, "alice", vec![near(0, 0.0)])
        .with_user(2, "bob", vec![]);
    let (_, classifier) =
        classifier(store, StaticEmbedder::returning(vec![0.9, 0.1, 0.0, 0.0]));

    let result = classifier.compare("alice", "bob", "anything").await;

    assert!(matches!(
        result,
        Err(ClassifierError::InsufficientData { handle }) if handle == "bob"
    ));
}

#[tokio::test]
async fn provider_drift_across_users_is_detected() {
    let store = MemoryStore::default()
        .with_user(1, "alice", vec![vec![1.0, 0.0, 0.0, 0.0]])
        .with_user(2, "bob", vec![vec![0.0, 1.0, 0.0]]);
    let (_, classifier) =
        classifier(store, StaticEmbedder::returning(vec![0.9, 0.1, 0.0, 0.0]));

    let result = classifier.compare("alice", "bob", "anything").await;

    assert!(matches!(
        result,
        Err(ClassifierError::DimensionMismatch {
            expected: 4,
            actual: 3
        })
    ));
}

#[tokio::test]
async fn probe_width_must_match_the_training_set() {
    let (_, classifier) = classifier(
        clustered_store(),
        StaticEmbedder::returning(vec![0.9, 0.1]),
    );

    let result = classifier.compare("alice", "bob", "anything").await;

    assert!(matches!(
        result,
        Err(ClassifierError::DimensionMismatch {
            expected: 4,
            actual: 2
        })
    ));
}

#[tokio::test]
async fn probe_embedding_failure_is_fatal() {
    let (_, classifier) = classifier(clustered_store(), StaticEmbedder::failing(4));

    let result = classifier.compare("alice", "bob", "anything").await;

    assert!(matches!(
        result,
        Err(ClassifierError::ProbeEmbedding(_))
    ));
}

#[tokio::test]
async fn probe_near_alice_is_attributed_to_alice() {
    let (_, classifier) = classifier(
        clustered_store(),
        StaticEmbedder::returning(vec![0.9, 0.1, 0.0, 0.0]),
    );

    let prediction = classifier.compare("alice", "bob", "sounds like alice").await.unwrap();
    assert_eq!(
        prediction,
        Prediction {
            predicted: "alice".to_string()
        }
    );
}

#[tokio::test]
async fn attribution_follows_provenance_not_argument_position() {
    // Swapping the argument order flips which label alice carries, but
    // the winning handle is the same person either way.
    let probe = vec![0.9, 0.1, 0.0, 0.0];

    let (_, forward) = classifier(clustered_store(), StaticEmbedder::returning(probe.clone()));
    let (_, reversed) = classifier(clustered_store(), StaticEmbedder::returning(probe));

    let a = forward.compare("alice", "bob", "probe").await.unwrap();
    let b = reversed.compare("bob", "alice", "probe").await.unwrap();

    assert_eq!(a.predicted, "alice");
    assert_eq!(b.predicted, "alice");
}

#[tokio::test]
async fn probe_near_bob_is_attributed_to_bob() {
    let (_, classifier) = classifier(
        clustered_store(),
        StaticEmbedder::returning(vec![0.0, 0.95, 0.05, 0.0]),
    );

    let prediction = classifier.compare("alice", "bob", "sounds like bob").await.unwrap();
    assert_eq!(prediction.predicted, "bob");
}

#[tokio::test]
async fn post_load_order_does_not_change_the_attribution() {
    let probe = vec![0.6, 0.4, 0.0, 0.0];

    let original = MemoryStore::default()
        .with_user(1, "alice", vec![near(0, 0.0), near(0, 0.1), near(0, 0.2)])
        .with_user(2, "bob", vec![near(1, 0.0), near(1, 0.1)]);
    let permuted = MemoryStore::default()
        .with_user(1, "alice", vec![near(0, 0.2), near(0, 0.0), near(0, 0.1)])
        .with_user(2, "bob", vec![near(1, 0.1), near(1, 0.0)]);

    let (_, first) = classifier(original, StaticEmbedder::returning(probe.clone()));
    let (_, second) = classifier(permuted, StaticEmbedder::returning(probe));

    let a = first.compare("alice", "bob", "probe").await.unwrap();
    let b = second.compare("alice", "bob", "probe").await.unwrap();
    assert_eq!(a.predicted, b.predicted);
}
