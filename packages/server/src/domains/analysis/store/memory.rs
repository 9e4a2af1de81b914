//! In-memory result store for tests and local runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{BaseResultStore, StoreError};
use crate::domains::analysis::models::{AnalysisRecord, NewAnalysisRecord};

/// Records kept in a map; lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<i64, AnalysisRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BaseResultStore for MemoryStore {
    async fn save(&self, record: &NewAnalysisRecord) -> Result<i64, StoreError> {
        let mut records = self.records.write().unwrap();
        let id = records.keys().next_back().map_or(1, |last| last + 1);
        records.insert(id, AnalysisRecord::from_new(id, record.clone(), Utc::now()));
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<AnalysisRecord, StoreError> {
        self.records
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}
