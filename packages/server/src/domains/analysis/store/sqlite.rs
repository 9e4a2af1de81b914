//! SQLite result store.
//!
//! A file-based store for single-server deployments and local development.
//! `sqlite::memory:` gives an ephemeral database for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;

use super::{BaseResultStore, StoreError};
use crate::domains::analysis::models::{AnalysisRecord, InsightReport, NewAnalysisRecord};

/// SQLite-backed result store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create the schema if needed.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - in-memory database (ephemeral)
    /// - `sqlite://pain_hunter.db` - file-based database, created if missing
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::Backend(Box::new(e)))?
            .create_if_missing(true);

        // Every connection to :memory: opens its own empty database, so the
        // pool must hold exactly one connection for its whole life.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::new("sqlite::memory:").await
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analysis_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                platform TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                analysis_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(Box::new(e)))?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct AnalysisRow {
    id: i64,
    url: String,
    platform: String,
    raw_text: String,
    analysis_json: String,
    created_at: String,
}

impl AnalysisRow {
    fn into_record(self) -> Result<AnalysisRecord, StoreError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Corrupt(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let analysis: InsightReport = serde_json::from_str(&self.analysis_json)
            .map_err(|e| StoreError::Corrupt(format!("Invalid analysis JSON: {}", e)))?;

        Ok(AnalysisRecord {
            id: self.id,
            url: self.url,
            platform: self.platform,
            raw_text: self.raw_text,
            analysis,
            created_at,
        })
    }
}

#[async_trait]
impl BaseResultStore for SqliteStore {
    async fn save(&self, record: &NewAnalysisRecord) -> Result<i64, StoreError> {
        let analysis_json = serde_json::to_string(&record.analysis)
            .map_err(|e| StoreError::Backend(Box::new(e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO analysis_results (url, platform, raw_text, analysis_json, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.url)
        .bind(&record.platform)
        .bind(&record.raw_text)
        .bind(analysis_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(Box::new(e)))?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> Result<AnalysisRecord, StoreError> {
        let row: Option<AnalysisRow> = sqlx::query_as(
            r#"
            SELECT id, url, platform, raw_text, analysis_json, created_at
            FROM analysis_results
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(Box::new(e)))?;

        row.ok_or(StoreError::NotFound(id))?.into_record()
    }
}
