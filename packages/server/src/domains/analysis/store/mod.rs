//! Result store: optional persistence of finished analyses.
//!
//! Stores assign integer ids on insert and look records up by id. The
//! pipeline treats a missing store as "don't persist", which is why the
//! store is always held as an `Option`.

pub mod memory;
pub mod sqlite;
pub mod supabase;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use super::models::{AnalysisRecord, NewAnalysisRecord};
use crate::config::StoreConfig;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

/// Table holding analyses in every SQL-backed store.
pub const ANALYSIS_TABLE: &str = "analysis_results";

#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this id
    #[error("analysis not found: {0}")]
    NotFound(i64),

    /// Backend failed (connection, query, HTTP)
    #[error("storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Stored row could not be decoded
    #[error("invalid stored record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        let message: String = message.into();
        StoreError::Backend(message.into())
    }
}

#[async_trait]
pub trait BaseResultStore: Send + Sync {
    /// Persist a record and return its new id.
    async fn save(&self, record: &NewAnalysisRecord) -> Result<i64, StoreError>;

    /// Fetch a record; [`StoreError::NotFound`] if the id was never assigned.
    async fn get(&self, id: i64) -> Result<AnalysisRecord, StoreError>;
}

/// Connect the configured store, if any.
pub async fn connect_store(config: &StoreConfig) -> Result<Option<Arc<dyn BaseResultStore>>> {
    let store: Arc<dyn BaseResultStore> = match config {
        StoreConfig::None => {
            info!("No result store configured, analyses will not be persisted");
            return Ok(None);
        }
        StoreConfig::Sqlite { url } => {
            info!("Using SQLite result store");
            Arc::new(SqliteStore::new(url).await?)
        }
        StoreConfig::Supabase { url, key } => {
            info!(url = %url, "Using Supabase result store");
            Arc::new(SupabaseStore::new(url, key)?)
        }
    };

    Ok(Some(store))
}
