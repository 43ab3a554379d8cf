//! Crawler module for single-page analysis
//!
//! This module contains the analysis engine, including:
//! - HTTP fetching with cancellation
//! - HTML parsing for title, headings, anchors and login forms
//! - HEAD-based link probing
//! - The analyzer that drives all of the above for one page

mod analyzer;
mod error;
mod fetcher;
mod parser;
mod prober;

pub use analyzer::PageAnalyzer;
pub use error::AnalyzeError;
pub use fetcher::{build_http_client, detect_html_version, fetch_page, FetchedPage};
pub use parser::{parse_document, ParsedPage};
pub use prober::{is_broken_status, LinkProber, ProbeResult, PROBE_FAILURE_STATUS};
