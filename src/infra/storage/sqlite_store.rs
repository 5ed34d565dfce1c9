// SQLite-backed key-value store for confessions and comments.
//
// Tables:
// - kv_store: namespaced key -> JSON record
//   (`confession:<id>`, `comment:<confession_id>:<id>`)
//
// SQLite allows a single writer, so every write transaction runs under one
// in-process lock. Reads go straight to the pool and see committed records only.

use crate::core::confessions::confession_store::{newest_first_comments, newest_first_confessions};
use crate::core::confessions::{
    comment_key, comment_prefix, confession_key, Comment, CommentStore, Confession,
    ConfessionError, ConfessionStore, CONFESSION_PREFIX,
};
use crate::core::identity::AnonymousId;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use std::path::Path;
use std::str::FromStr;
use tokio::sync::Mutex;

fn storage_err(e: impl std::fmt::Display) -> ConfessionError {
    ConfessionError::StorageError(e.to_string())
}

pub struct SqliteConfessionStore {
    pool: Pool<Sqlite>,
    write_lock: Mutex<()>,
}

impl SqliteConfessionStore {
    /// Open (creating if needed) the database at `database_url` and migrate it.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") {
            if let Some(parent) = Path::new(path_str).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Ok(Self::from_pool(pool).await?)
    }

    /// Wrap an existing pool and run migrations.
    pub async fn from_pool(pool: Pool<Sqlite>) -> Result<Self, ConfessionError> {
        let store = Self {
            pool,
            write_lock: Mutex::new(()),
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create required tables.
    async fn migrate(&self) -> Result<(), ConfessionError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn get_value<T: DeserializeOwned>(
        conn: &mut SqliteConnection,
        key: &str,
    ) -> Result<Option<T>, ConfessionError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(conn)
            .await
            .map_err(storage_err)?;

        row.map(|r| {
            let raw: String = r.get("value");
            serde_json::from_str(&raw).map_err(storage_err)
        })
        .transpose()
    }

    async fn set_value<T: Serialize>(
        conn: &mut SqliteConnection,
        key: &str,
        value: &T,
    ) -> Result<(), ConfessionError> {
        let raw = serde_json::to_string(value).map_err(storage_err)?;
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value
            "#,
        )
        .bind(key)
        .bind(raw)
        .execute(conn)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    /// All values whose key starts with `prefix`.
    async fn get_by_prefix<T: DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> Result<Vec<T>, ConfessionError> {
        // substr instead of LIKE so ids containing '%' or '_' match literally.
        let rows =
            sqlx::query("SELECT value FROM kv_store WHERE substr(key, 1, length(?1)) = ?1")
                .bind(prefix)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_err)?;

        rows.into_iter()
            .map(|row| {
                let raw: String = row.get("value");
                serde_json::from_str(&raw).map_err(storage_err)
            })
            .collect()
    }
}

#[async_trait]
impl ConfessionStore for SqliteConfessionStore {
    async fn create(&self, content: &str) -> Result<Confession, ConfessionError> {
        let confession = Confession::new(content);
        let _guard = self.write_lock.lock().await;
        let mut conn = self.pool.acquire().await.map_err(storage_err)?;
        Self::set_value(&mut conn, &confession_key(&confession.id), &confession).await?;
        Ok(confession)
    }

    async fn list(&self) -> Result<Vec<Confession>, ConfessionError> {
        let all = self.get_by_prefix(CONFESSION_PREFIX).await?;
        Ok(newest_first_confessions(all))
    }

    async fn get(&self, id: &str) -> Result<Option<Confession>, ConfessionError> {
        let mut conn = self.pool.acquire().await.map_err(storage_err)?;
        Self::get_value(&mut conn, &confession_key(id)).await
    }

    async fn toggle_like(
        &self,
        id: &str,
        identity: &AnonymousId,
    ) -> Result<Confession, ConfessionError> {
        let key = confession_key(id);
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let mut confession: Confession = Self::get_value(&mut tx, &key)
            .await?
            .ok_or_else(|| ConfessionError::NotFound(id.to_string()))?;
        confession.toggle_like(identity);
        Self::set_value(&mut tx, &key, &confession).await?;

        tx.commit().await.map_err(storage_err)?;
        Ok(confession)
    }
}

#[async_trait]
impl CommentStore for SqliteConfessionStore {
    async fn append(
        &self,
        confession_id: &str,
        content: &str,
    ) -> Result<Comment, ConfessionError> {
        let key = confession_key(confession_id);
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let mut parent: Confession = Self::get_value(&mut tx, &key)
            .await?
            .ok_or_else(|| ConfessionError::NotFound(confession_id.to_string()))?;

        let comment = Comment::new(confession_id, content);
        parent.comment_count = parent.comment_count.saturating_add(1);
        Self::set_value(&mut tx, &comment_key(confession_id, &comment.id), &comment).await?;
        Self::set_value(&mut tx, &key, &parent).await?;

        // Dropping the transaction on any error above rolls both writes back.
        tx.commit().await.map_err(storage_err)?;
        Ok(comment)
    }

    async fn list_for(&self, confession_id: &str) -> Result<Vec<Comment>, ConfessionError> {
        let comments = self.get_by_prefix(&comment_prefix(confession_id)).await?;
        Ok(newest_first_comments(comments))
    }
}
