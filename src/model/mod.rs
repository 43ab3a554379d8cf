//! Data model for analysis jobs
//!
//! # Components
//!
//! - `JobStatus`: lifecycle of a single analysis run (queued, running, done, error, stopped)
//! - `AnalysisRecord`: the persisted result of a run
//! - `BrokenLink` / `HeadingCounts`: pieces of the record

mod record;
mod status;

// Re-export main types
pub use record::{AnalysisRecord, BrokenLink, HeadingCounts, HEADING_TAGS};
pub use status::JobStatus;
