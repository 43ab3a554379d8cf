//! Storage traits and error types
//!
//! This module defines the record-store contract used by the job
//! orchestrator and the errors a backend may report.

use crate::model::AnalysisRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Key-value store of analysis records keyed by job id
///
/// Implementations are not required to be thread-safe; the orchestrator
/// serializes access behind a mutex.
pub trait RecordStore {
    /// Inserts the record, replacing any record with the same id
    fn save(&mut self, record: &AnalysisRecord) -> StorageResult<()>;

    /// Gets a record by job id
    fn get(&self, id: &str) -> StorageResult<Option<AnalysisRecord>>;

    /// Gets every record, oldest submission first
    fn get_all(&self) -> StorageResult<Vec<AnalysisRecord>>;

    /// Overwrites the record stored under `id`
    ///
    /// Returns false if no record exists for `id`; nothing is inserted.
    fn update(&mut self, id: &str, record: &AnalysisRecord) -> StorageResult<bool>;

    /// Deletes the record stored under `id`
    ///
    /// Returns false if no record existed.
    fn delete(&mut self, id: &str) -> StorageResult<bool>;
}
