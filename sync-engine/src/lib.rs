//! Incremental timeline ingestion.
//!
//! One sync reconciles the local store with the remote feed for a single
//! handle: fetch past the cursor, embed what is genuinely new, commit the
//! batch and the cursor advance as one unit. Repeating a sync is always
//! safe: posts dedup by id and the cursor never moves backwards.

use std::sync::Arc;
use tracing::{info, warn};
use whosaid_core::{
    truncate_post_text, CoreError, Post, Store, SyncReport, TextEmbedder, TimelineSource, User,
};


pub struct SyncEngine {
    store: Arc<dyn Store>,
    source: Arc<dyn TimelineSource>,
    embedder: Arc<dyn TextEmbedder>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn Store>,
        source: Arc<dyn TimelineSource>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Self {
        Self {
            store,
            source,
            embedder,
        }
    }

    /// Sync one handle. Concurrent syncs for distinct handles are safe;
    /// callers must serialize syncs for the same handle.
    pub async fn sync(&self, handle: &str) -> Result<SyncReport, CoreError> {
        let remote = self.source.lookup_user(handle).await?;

        // A previously unknown handle gets a fresh user with no cursor.
        // It is only persisted inside the final commit, so any failure
        // before that leaves no residue.
        let user = match self.store.get_user_by_handle(handle).await? {
            Some(existing) => existing,
            None => User {
                id: remote.id,
                handle: handle.to_string(),
                newest_post_id: None,
            },
        };

        let fetched = self.source.fetch_posts(handle, user.newest_post_id).await?;

        // Cursor candidate is fixed from the fetched ids before any
        // embedding work, so one failing post cannot stall future syncs
        // on content that was already fetched.
        let cursor_candidate = fetched.iter().map(|p| p.id).max();

        let mut staged = Vec::new();
        let mut skipped = 0usize;
        let mut embed_failures = 0usize;

        for feed_post in &fetched {
            // The source may return ids at or below the cursor; dedup by
            // stored id rather than trusting the filter.
            if self.store.post_exists(feed_post.id).await? {
                skipped += 1;
                continue;
            }

            let text = truncate_post_text(&feed_post.text);
            match self.embedder.embed(&text).await {
                Ok(embedding) => staged.push(Post {
                    id: feed_post.id,
                    user_id: user.id,
                    text,
                    embedding,
                }),
                Err(e) => {
                    // Deliberate policy: one bad post never fails the
                    // batch; it is dropped and the sync continues.
                    warn!(
                        "Skipping post {} for {}: embedding failed: {}",
                        feed_post.id, handle, e
                    );
                    embed_failures += 1;
                }
            }
        }

        self.store
            .commit_sync(&user, cursor_candidate, &staged)
            .await?;

        let cursor = match (user.newest_post_id, cursor_candidate) {
            (Some(current), Some(candidate)) => Some(current.max(candidate)),
            (current, candidate) => candidate.or(current),
        };

        let report = SyncReport {
            handle: handle.to_string(),
            fetched: fetched.len(),
            ingested: staged.len(),
            skipped,
            embed_failures,
            cursor,
        };
        info!(
            "Synced {}: {} fetched, {} ingested, {} already stored, {} embed failures, cursor {:?}",
            report.handle,
            report.fetched,
            report.ingested,
            report.skipped,
            report.embed_failures,
            report.cursor
        );
        Ok(report)
    }
}
