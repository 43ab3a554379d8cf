//! Output module for presenting analysis records
//!
//! This module handles:
//! - Rendering a record as readable text or JSON
//! - Summarizing stored jobs by status

pub mod stats;

pub use stats::{print_summary, summarize, StatusSummary};

use crate::model::AnalysisRecord;

/// Renders a record as JSON
pub fn render_json(record: &AnalysisRecord) -> serde_json::Result<String> {
    serde_json::to_string_pretty(record)
}

/// Renders a record as a multi-line text block
pub fn render_record(record: &AnalysisRecord) -> String {
    let mut out = String::new();

    out.push_str(&format!("{} [{}]\n", record.url, record.status));
    out.push_str(&format!("  Job: {}\n", record.id));

    if !record.title.is_empty() {
        out.push_str(&format!("  Title: {}\n", record.title));
    }
    if !record.html_version.is_empty() {
        out.push_str(&format!("  HTML version: {}\n", record.html_version));
    }

    if !record.headings.is_empty() {
        let headings: Vec<String> = record
            .headings
            .iter()
            .map(|(tag, count)| format!("{}={}", tag, count))
            .collect();
        out.push_str(&format!("  Headings: {}\n", headings.join(" ")));
    }

    out.push_str(&format!(
        "  Links: {} internal, {} external, {} accessible, {} broken\n",
        record.internal_links,
        record.external_links,
        record.accessible_links,
        record.broken_links.len()
    ));

    for link in &record.broken_links {
        out.push_str(&format!("    {} {}\n", link.status, link.url));
    }

    out.push_str(&format!(
        "  Login form: {}\n",
        if record.has_login_form { "yes" } else { "no" }
    ));

    out
}
