//! Persistent record of delivered articles, keyed by URL.
//!
//! Backed by a SQLite file through an `sqlx` connection pool, so the
//! scheduler task and the HTTP trigger can both use one [`DedupStore`]
//! handle concurrently. Recording a URL twice is not an error: the unique
//! index absorbs the second insert.

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, instrument};

use crate::error::DedupError;
use crate::models::SentArticleRecord;

const MIGRATIONS: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS sent_articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        title TEXT,
        sent_date DATE,
        source TEXT
    )
    "#];

#[derive(Debug, Clone)]
pub struct DedupStore {
    pool: SqlitePool,
}

impl DedupStore {
    /// Open (creating if needed) the database at `path` and ensure the schema.
    #[instrument(level = "info")]
    pub async fn open(path: &str) -> Result<Self, DedupError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| DedupError::Directory {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        info!("Dedup store ready");
        Ok(store)
    }

    /// A private in-memory database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, DedupError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A single connection: every pooled in-memory connection would be its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), DedupError> {
        for migration in MIGRATIONS {
            sqlx::query(migration).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Whether `url` has already been delivered.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute article URL, compared exactly
    ///
    /// # Returns
    ///
    /// `true` once [`DedupStore::record_sent`] has stored the URL, in this
    /// process or an earlier one sharing the database file.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let store = DedupStore::open("./sent_articles.db").await?;
    /// if !store.seen("https://techcabal.com/2025/05/06/acme").await? {
    ///     // offer it in today's digest
    /// }
    /// ```
    pub async fn seen(&self, url: &str) -> Result<bool, DedupError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sent_articles WHERE url = ?")
            .bind(url)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Record `url` as delivered.
    ///
    /// Returns `false` when the URL was already recorded.
    #[instrument(level = "debug", skip(self, title))]
    pub async fn record_sent(
        &self,
        url: &str,
        title: &str,
        sent_date: NaiveDate,
        source: &str,
    ) -> Result<bool, DedupError> {
        let result = sqlx::query(
            "INSERT INTO sent_articles (url, title, sent_date, source) VALUES (?, ?, ?, ?)",
        )
        .bind(url)
        .bind(title)
        .bind(sent_date)
        .bind(source)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!("Already recorded");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Number of delivered articles on record.
    pub async fn sent_count(&self) -> Result<i64, DedupError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sent_articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close every pooled connection. Later calls fail with a pool error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// The most recently recorded deliveries, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<SentArticleRecord>, DedupError> {
        let records = sqlx::query_as::<_, SentArticleRecord>(
            r#"
            SELECT url, COALESCE(title, '') AS title, sent_date, COALESCE(source, '') AS source
            FROM sent_articles
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    #[tokio::test]
    async fn test_record_then_seen() {
        let store = DedupStore::in_memory().await.unwrap();
        let url = "https://example.test/posts/42";

        assert!(!store.seen(url).await.unwrap());
        assert!(store.record_sent(url, "T", day(), "Example").await.unwrap());
        assert!(store.seen(url).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_record_is_absorbed() {
        let store = DedupStore::in_memory().await.unwrap();
        let url = "https://example.test/a";

        assert!(store.record_sent(url, "T", day(), "Example").await.unwrap());
        assert!(!store.record_sent(url, "T again", day(), "Example").await.unwrap());
        assert_eq!(store.sent_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/sent.db");
        let path = path.to_str().unwrap();

        {
            let store = DedupStore::open(path).await.unwrap();
            store
                .record_sent("https://example.test/a", "A", day(), "Example")
                .await
                .unwrap();
        }

        let reopened = DedupStore::open(path).await.unwrap();
        assert!(reopened.seen("https://example.test/a").await.unwrap());
        assert!(!reopened.seen("https://example.test/b").await.unwrap());
    }

    #[tokio::test]
    async fn test_recent_newest_first() {
        let store = DedupStore::in_memory().await.unwrap();
        store.record_sent("https://e.test/1", "One", day(), "E").await.unwrap();
        store.record_sent("https://e.test/2", "Two", day(), "E").await.unwrap();

        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].url, "https://e.test/2");
        assert_eq!(recent[0].title, "Two");
        assert_eq!(recent[1].sent_date, day());
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_records_race_harmlessly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sent.db");
        let store = DedupStore::open(path.to_str().unwrap()).await.unwrap();

        let attempts = (0..8).map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .record_sent("https://e.test/same", "Same", day(), "E")
                    .await
            })
        });
        let results = futures::future::join_all(attempts).await;
        let inserted = results
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .filter(|inserted| *inserted)
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(store.sent_count().await.unwrap(), 1);
    }
}
