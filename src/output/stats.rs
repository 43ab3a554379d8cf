//! Status summaries over stored records
//!
//! Counts jobs per status and aggregates link totals for display.

use crate::model::{AnalysisRecord, JobStatus};
use std::collections::HashMap;

/// Aggregate view of a set of analysis records
#[derive(Debug, Clone, Default)]
pub struct StatusSummary {
    /// Number of jobs
    pub total_jobs: u64,

    /// Count of jobs by status
    pub jobs_by_status: HashMap<JobStatus, u64>,

    /// Links probed across all records
    pub total_links: u64,

    /// Broken links across all records
    pub broken_links: u64,

    /// Pages with a login form
    pub login_pages: u64,
}

impl StatusSummary {
    pub fn count(&self, status: JobStatus) -> u64 {
        self.jobs_by_status.get(&status).copied().unwrap_or(0)
    }

    /// Percentage of finished jobs that ended `done`
    pub fn success_rate(&self) -> f64 {
        let finished: u64 = JobStatus::all_states()
            .into_iter()
            .filter(JobStatus::is_terminal)
            .map(|s| self.count(s))
            .sum();

        if finished == 0 {
            0.0
        } else {
            (self.count(JobStatus::Done) as f64 / finished as f64) * 100.0
        }
    }
}

/// Builds a summary from records
pub fn summarize(records: &[AnalysisRecord]) -> StatusSummary {
    let mut summary = StatusSummary::default();

    for record in records {
        summary.total_jobs += 1;
        *summary.jobs_by_status.entry(record.status).or_insert(0) += 1;
        summary.total_links += u64::from(record.links_checked());
        summary.broken_links += record.broken_links.len() as u64;
        if record.has_login_form {
            summary.login_pages += 1;
        }
    }

    summary
}

/// Prints a summary to stdout
pub fn print_summary(summary: &StatusSummary) {
    println!("=== Job Summary ===\n");

    println!("Overview:");
    println!("  Total jobs: {}", summary.total_jobs);
    println!("  Links probed: {}", summary.total_links);
    println!("  Broken links: {}", summary.broken_links);
    println!("  Pages with login form: {}", summary.login_pages);
    println!("  Success rate: {:.1}%", summary.success_rate());
    println!();

    println!("Jobs by Status:");
    for status in JobStatus::all_states() {
        let count = summary.count(status);
        if count == 0 {
            continue;
        }
        let percentage = (count as f64 / summary.total_jobs as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
}
