//! Page-Lens: single-page web analysis as cancelable background jobs
//!
//! This crate fetches a page, inspects its document structure (title, HTML
//! version, heading counts, login forms), probes every link it finds, and
//! tracks each analysis as a job whose status can be observed and stopped.

pub mod config;
pub mod crawler;
pub mod jobs;
pub mod model;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Page-Lens operations
#[derive(Debug, Error)]
pub enum LensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Job error: {0}")]
    Job(#[from] jobs::JobError),

    #[error("Analysis error: {0}")]
    Analyze(#[from] crawler::AnalyzeError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Page-Lens operations
pub type Result<T> = std::result::Result<T, LensError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use jobs::{JobEvent, JobRegistry, Orchestrator};
pub use model::{AnalysisRecord, BrokenLink, HeadingCounts, JobStatus};
pub use url::{is_internal, resolve_link};
