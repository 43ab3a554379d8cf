//! Job lifecycle management
//!
//! This module tracks analyses as background jobs:
//! - `JobRegistry` owns the cancellation handle of every in-flight run
//! - `Orchestrator` spawns runs, drives status transitions and persists records

mod orchestrator;
mod registry;

pub use orchestrator::{JobEvent, Orchestrator};
pub use registry::{CancelReason, CancellationHandle, JobRegistry};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors surfaced to callers of the job API
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job is not running: {0}")]
    NotRunning(String),

    #[error("Job already has a run in flight: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid URL: {0:?}")]
    InvalidUrl(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for job operations
pub type JobResult<T> = Result<T, JobError>;
