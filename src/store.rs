// src/store.rs
//! SQLite-backed persisted item store plus the run audit table.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use crate::ingest::types::ItemKey;
use crate::ranking::ScoredItem;
use crate::report::RunResult;

/// Idempotent DDL, applied in order by `migrate()`.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS digest_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source TEXT NOT NULL,
        natural_key TEXT NOT NULL,
        title TEXT NOT NULL,
        url TEXT NOT NULL,
        summary TEXT,
        published_at TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        relevance_score REAL NOT NULL,
        matched_interests TEXT NOT NULL DEFAULT '[]',
        run_id TEXT NOT NULL,
        selected_at TEXT NOT NULL,
        UNIQUE (source, natural_key)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_digest_items_selected_at
        ON digest_items (selected_at)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pipeline_runs (
        run_id TEXT PRIMARY KEY,
        started_at TEXT NOT NULL,
        finished_at TEXT NOT NULL,
        success INTEGER NOT NULL,
        written_count INTEGER NOT NULL,
        result TEXT NOT NULL
    )
    "#,
];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Keys that already existed; the whole batch was rolled back.
    #[error("uniqueness conflict on {} key(s): {}", .0.len(), join_keys(.0))]
    Conflict(Vec<ItemKey>),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_keys(keys: &[ItemKey]) -> String {
    keys.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl StoreError {
    pub fn conflicts(&self) -> &[ItemKey] {
        match self {
            StoreError::Conflict(keys) => keys,
            _ => &[],
        }
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[derive(Clone, Debug)]
pub struct Store {
    pool: Arc<SqlitePool>,
}

impl Store {
    /// Open (creating if missing) the database at `url`.
    ///
    /// In-memory databases live as long as their one connection, so the pool
    /// is pinned to a single connection that never idles out.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = if is_in_memory(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(opts)
                .await?
        } else {
            if let Some(parent) = opts.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(opts)
                .await?
        };

        tracing::debug!(url = %url, "store connected");
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Apply the schema. Safe to call any number of times.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration).execute(&*self.pool).await.map_err(|e| {
                tracing::error!(step = i, error = %e, "migration failed");
                StoreError::Database(e)
            })?;
        }
        tracing::info!(steps = MIGRATIONS.len(), "schema up to date");
        Ok(())
    }

    /// Every key ever persisted.
    pub async fn existing_keys(&self) -> Result<HashSet<ItemKey>, StoreError> {
        let rows = sqlx::query("SELECT source, natural_key FROM digest_items")
            .fetch_all(&*self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| ItemKey::new(r.get::<String, _>("source"), r.get::<String, _>("natural_key")))
            .collect())
    }

    /// Insert the selection in one transaction.
    ///
    /// Any key that already exists (or repeats within `items`) makes the whole
    /// batch roll back with `StoreError::Conflict` listing every such key.
    pub async fn insert_all(&self, items: &[ScoredItem], run_id: &str) -> Result<usize, StoreError> {
        let selected_at = chrono::Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut conflicts = Vec::new();
        let mut written = 0usize;

        for s in items {
            let metadata = serde_json::to_string(&s.item.metadata)?;
            let matched = serde_json::to_string(&s.matched_interests)?;
            let res = sqlx::query(
                r#"
                INSERT INTO digest_items
                (source, natural_key, title, url, summary, published_at, metadata,
                 relevance_score, matched_interests, run_id, selected_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (source, natural_key) DO NOTHING
                "#,
            )
            .bind(&s.item.source)
            .bind(&s.item.natural_key)
            .bind(&s.item.title)
            .bind(&s.item.url)
            .bind(s.item.summary.as_deref())
            .bind(s.item.published_at)
            .bind(metadata)
            .bind(s.relevance_score)
            .bind(matched)
            .bind(run_id)
            .bind(selected_at)
            .execute(&mut *tx)
            .await?;

            if res.rows_affected() == 0 {
                conflicts.push(s.item.key());
            } else {
                written += 1;
            }
        }

        if !conflicts.is_empty() {
            tx.rollback().await?;
            tracing::warn!(run_id, conflicts = conflicts.len(), "commit rolled back on uniqueness conflict");
            return Err(StoreError::Conflict(conflicts));
        }

        tx.commit().await?;
        tracing::info!(run_id, written, "selection committed");
        Ok(written)
    }

    /// Append the run's audit row.
    pub async fn record_run(&self, result: &RunResult) -> Result<(), StoreError> {
        let body = serde_json::to_string(result)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO pipeline_runs
            (run_id, started_at, finished_at, success, written_count, result)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&result.run_id)
        .bind(result.started_at)
        .bind(result.finished_at)
        .bind(result.success)
        .bind(result.written_count as i64)
        .bind(body)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn item_count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM digest_items")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get::<i64, _>("n"))
    }

    pub async fn run_count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM pipeline_runs")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get::<i64, _>("n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Item;
    use chrono::Utc;

    fn scored(source: &str, key: &str) -> ScoredItem {
        ScoredItem {
            item: Item {
                source: source.into(),
                natural_key: key.into(),
                title: format!("title {key}"),
                published_at: Utc::now(),
                url: format!("https://example.test/{key}"),
                summary: Some("s".into()),
                metadata: Default::default(),
            },
            relevance_score: 1.5,
            matched_interests: vec!["RAG".into()],
            reasons: vec![],
        }
    }

    async fn mem_store() -> Store {
        let s = Store::connect("sqlite::memory:").await.unwrap();
        s.migrate().await.unwrap();
        s
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let s = mem_store().await;
        s.migrate().await.unwrap();
        assert_eq!(s.item_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_then_keys_visible() {
        let s = mem_store().await;
        let n = s.insert_all(&[scored("openai", "a"), scored("youtube", "a")], "r1").await.unwrap();
        assert_eq!(n, 2);
        let keys = s.existing_keys().await.unwrap();
        assert!(keys.contains(&ItemKey::new("openai", "a")));
        assert!(keys.contains(&ItemKey::new("youtube", "a")));
    }

    #[tokio::test]
    async fn conflict_rolls_back_whole_batch() {
        let s = mem_store().await;
        s.insert_all(&[scored("openai", "a")], "r1").await.unwrap();

        let err = s
            .insert_all(&[scored("openai", "b"), scored("openai", "a"), scored("openai", "c")], "r2")
            .await
            .unwrap_err();
        assert_eq!(err.conflicts(), &[ItemKey::new("openai", "a")]);
        assert_eq!(s.item_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_schema_is_a_read_error() {
        let s = Store::connect("sqlite::memory:").await.unwrap();
        assert!(matches!(s.existing_keys().await, Err(StoreError::Database(_))));
    }

    #[tokio::test]
    async fn file_database_creates_parent_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/nested/digest.db", tmp.path().display());
        let s = Store::connect(&url).await.unwrap();
        s.migrate().await.unwrap();
        assert!(tmp.path().join("nested/digest.db").exists());
    }
}
