//! Analysis record types
//!
//! These are the values persisted per job and handed to callers. Field names
//! on the wire match the stored JSON layout.

use crate::model::JobStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Heading levels counted by the analyzer, in document order
pub const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Heading tag -> element count, keyed `H1`..`H6`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadingCounts(BTreeMap<String, u32>);

impl HeadingCounts {
    /// Creates a mapping with every level present and set to zero
    pub fn zeroed() -> Self {
        Self(
            HEADING_TAGS
                .iter()
                .map(|tag| (tag.to_uppercase(), 0))
                .collect(),
        )
    }

    /// Sets the count for a tag such as `h2` or `H2`
    pub fn set(&mut self, tag: &str, count: u32) {
        self.0.insert(tag.to_uppercase(), count);
    }

    /// Count for a tag, zero when the level is absent
    pub fn get(&self, tag: &str) -> u32 {
        self.0.get(&tag.to_uppercase()).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(tag, count)| (tag.as_str(), *count))
    }
}

/// A link whose probe returned an error status or failed outright
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub url: String,
    pub status: u16,
}

/// Result of analyzing one page, plus the job status that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub url: String,
    pub status: JobStatus,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_version: String,

    #[serde(default, skip_serializing_if = "HeadingCounts::is_empty")]
    pub headings: HeadingCounts,

    #[serde(default)]
    pub internal_links: u32,

    #[serde(default)]
    pub external_links: u32,

    #[serde(default)]
    pub accessible_links: u32,

    #[serde(default)]
    pub broken_links: Vec<BrokenLink>,

    #[serde(default)]
    pub has_login_form: bool,
}

impl AnalysisRecord {
    /// Creates an empty record for `url` in the given status
    pub fn new(id: impl Into<String>, url: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            status,
            title: String::new(),
            html_version: String::new(),
            headings: HeadingCounts::default(),
            internal_links: 0,
            external_links: 0,
            accessible_links: 0,
            broken_links: Vec::new(),
            has_login_form: false,
        }
    }

    /// Placeholder written when a job is accepted
    pub fn queued(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(id, url, JobStatus::Queued)
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    /// Total number of links that were classified and probed
    pub fn links_checked(&self) -> u32 {
        self.internal_links + self.external_links
    }
}
