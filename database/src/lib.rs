//! SQLite-backed [`Store`].
//!
//! Embeddings are persisted as a JSON array column whose length must
//! equal the store's configured dimensionality; the check runs at write
//! time so an invalid post can never land. The sync commit is a single
//! transaction: user upsert, cursor max-merge, batch post insert.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};
use whosaid_core::{Post, Store, StoreError, User};


const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id             INTEGER PRIMARY KEY,
        handle         TEXT NOT NULL UNIQUE,
        newest_post_id INTEGER
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id        INTEGER PRIMARY KEY,
        user_id   INTEGER NOT NULL REFERENCES users(id),
        text      TEXT NOT NULL,
        embedding TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_posts_user_id ON posts(user_id)",
];

pub struct SqliteStore {
    pool: SqlitePool,
    dimensions: usize,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url`, e.g.
    /// `sqlite://whosaid.db`. `dimensions` is the embedding width every
    /// stored vector must have.
    pub async fn connect(url: &str, dimensions: usize) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::ConnectionFailed {
                reason: e.to_string(),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        info!("Connected to store at {}", url);
        Ok(Self { pool, dimensions })
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed {
                    reason: e.to_string(),
                })?;
        }
        debug!("Store schema is current");
        Ok(())
    }

    /// Bulk reset: drop everything and recreate the schema. Owned by the
    /// presentation layer, never called by the engines.
    pub async fn reset(&self) -> Result<(), StoreError> {
        sqlx::query("DROP TABLE IF EXISTS posts")
            .execute(&self.pool)
            .await?;
        sqlx::query("DROP TABLE IF EXISTS users")
            .execute(&self.pool)
            .await?;
        self.run_migrations().await?;
        info!("Store reset");
        Ok(())
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub async fn post_count_for_user(&self, user_id: i64) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM posts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        handle: row.try_get("handle")?,
        newest_post_id: row.try_get("newest_post_id")?,
    })
}

fn post_from_row(row: &SqliteRow) -> Result<Post, StoreError> {
    let id: i64 = row.try_get("id").map_err(StoreError::Sql)?;
    let raw: String = row.try_get("embedding").map_err(StoreError::Sql)?;
    let embedding: Vec<f32> =
        serde_json::from_str(&raw).map_err(|e| StoreError::CorruptEmbedding {
            post_id: id,
            details: e.to_string(),
        })?;
    Ok(Post {
        id,
        user_id: row.try_get("user_id").map_err(StoreError::Sql)?,
        text: row.try_get("text").map_err(StoreError::Sql)?,
        embedding,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_user_by_handle(&self, handle: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, handle, newest_post_id FROM users WHERE handle = ?")
            .bind(handle)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose().map_err(Into::into)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query("SELECT id, handle, newest_post_id FROM users ORDER BY handle")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    async fn posts_for_user(&self, user_id: i64) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query("SELECT id, user_id, text, embedding FROM posts WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(post_from_row).collect()
    }

    async fn post_exists(&self, post_id: i64) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn commit_sync(
        &self,
        user: &User,
        cursor: Option<i64>,
        posts: &[Post],
    ) -> Result<(), StoreError> {
        // Write-time invariant: reject the whole batch before opening the
        // transaction if any vector has the wrong width.
        for post in posts {
            if post.embedding.len() != self.dimensions {
                return Err(StoreError::DimensionMismatch {
                    post_id: post.id,
                    expected: self.dimensions,
                    actual: post.embedding.len(),
                });
            }
        }

        let mut tx = self.pool.begin().await?;

        // Cursor merge never regresses and never clears an existing
        // value, so a slow sync committing late cannot undo a fast one.
        sqlx::query(
            "INSERT INTO users (id, handle, newest_post_id) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET newest_post_id = CASE
                 WHEN excluded.newest_post_id IS NULL THEN users.newest_post_id
                 WHEN users.newest_post_id IS NULL THEN excluded.newest_post_id
                 ELSE MAX(users.newest_post_id, excluded.newest_post_id)
             END",
        )
        .bind(user.id)
        .bind(&user.handle)
        .bind(cursor)
        .execute(&mut *tx)
        .await?;

        for post in posts {
            let embedding = serde_json::to_string(&post.embedding).map_err(|e| {
                StoreError::CorruptEmbedding {
                    post_id: post.id,
                    details: e.to_string(),
                }
            })?;
            sqlx::query(
                "INSERT INTO posts (id, user_id, text, embedding) VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO NOTHING",
            )
            .bind(post.id)
            .bind(post.user_id)
            .bind(&post.text)
            .bind(embedding)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(
            "Committed sync for {}: {} posts, cursor candidate {:?}",
            user.handle,
            posts.len(),
            cursor
        );
        Ok(())
    }
}
