use crate::error::{EmbeddingError, FeedError, StoreError};
use crate::types::{FeedPost, FeedUser, Post, User};
use async_trait::async_trait;

/// Read access to a remote per-user timeline.
#[async_trait]
pub trait TimelineSource: Send + Sync {
    /// Resolve a handle to its remote identity. Surfaces
    /// [`FeedError::UnknownHandle`] when the handle does not exist.
    async fn lookup_user(&self, handle: &str) -> Result<FeedUser, FeedError>;

    /// Fetch posts newer than `since_id` (all posts when `None`),
    /// newest-first. The source may return more than requested; callers
    /// must not assume an exactly filtered result.
    async fn fetch_posts(
        &self,
        handle: &str,
        since_id: Option<i64>,
    ) -> Result<Vec<FeedPost>, FeedError>;
}

/// Text-to-vector conversion. One provider instance per process; every
/// embedding that will ever be compared must come from the same model.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output width of every vector this embedder produces.
    fn dimensions(&self) -> usize;
}

/// Durable keyed storage for users and their embedded posts. The store
/// exclusively owns both collections; engines only read and upsert
/// through this interface.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_user_by_handle(&self, handle: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn posts_for_user(&self, user_id: i64) -> Result<Vec<Post>, StoreError>;

    async fn post_exists(&self, post_id: i64) -> Result<bool, StoreError>;

    /// Commit one sync atomically: upsert the user, advance the cursor to
    /// `max(current, cursor)` (never regressing, never clearing), and
    /// insert the staged posts, deduplicated by id. Either everything
    /// lands or nothing does.
    async fn commit_sync(
        &self,
        user: &User,
        cursor: Option<i64>,
        posts: &[Post],
    ) -> Result<(), StoreError>;
}
