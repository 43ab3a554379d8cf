//! In-memory storage implementation
//!
//! Records live in a `HashMap`; a separate id list keeps submission order.

use crate::model::AnalysisRecord;
use crate::storage::traits::{RecordStore, StorageResult};
use std::collections::HashMap;

/// Volatile record store
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: HashMap<String, AnalysisRecord>,
    order: Vec<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStorage {
    fn save(&mut self, record: &AnalysisRecord) -> StorageResult<()> {
        if self
            .records
            .insert(record.id.clone(), record.clone())
            .is_none()
        {
            self.order.push(record.id.clone());
        }
        Ok(())
    }

    fn get(&self, id: &str) -> StorageResult<Option<AnalysisRecord>> {
        Ok(self.records.get(id).cloned())
    }

    fn get_all(&self) -> StorageResult<Vec<AnalysisRecord>> {
        Ok(self
            .order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect())
    }

    fn update(&mut self, id: &str, record: &AnalysisRecord) -> StorageResult<bool> {
        match self.records.get_mut(id) {
            Some(existing) => {
                *existing = AnalysisRecord {
                    id: id.to_string(),
                    ..record.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&mut self, id: &str) -> StorageResult<bool> {
        if self.records.remove(id).is_none() {
            return Ok(false);
        }
        self.order.retain(|existing| existing != id);
        Ok(true)
    }
}
