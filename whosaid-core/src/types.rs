use serde::{Deserialize, Serialize};

/// Post text is capped at this many characters before it is embedded or
/// stored. Longer remote posts are truncated, never rejected.
pub const MAX_POST_CHARS: usize = 300;

/// A feed user as stored locally. `newest_post_id` is the sync cursor:
/// the highest post id already ingested, `None` for a user that has never
/// been synced. When present it equals the maximum stored post id for
/// this user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub handle: String,
    pub newest_post_id: Option<i64>,
}

/// A stored post. Immutable once written; a post without an embedding of
/// the store's configured width is invalid and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A user's identity as reported by the remote feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedUser {
    pub id: i64,
    pub handle: String,
}

/// A remote post before embedding. The feed returns these newest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: i64,
    pub text: String,
}

/// Outcome of one sync call for one handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub handle: String,
    /// Posts returned by the feed this call.
    pub fetched: usize,
    /// Posts newly embedded and committed.
    pub ingested: usize,
    /// Posts skipped because they were already stored.
    pub skipped: usize,
    /// Posts dropped because embedding them failed.
    pub embed_failures: usize,
    /// Cursor after the commit.
    pub cursor: Option<i64>,
}

/// Truncate to [`MAX_POST_CHARS`] characters, safe on any UTF-8 input.
pub fn truncate_post_text(text: &str) -> String {
    match text.char_indices().nth(MAX_POST_CHARS) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
