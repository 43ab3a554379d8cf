//! Page analyzer
//!
//! Fetches one page, reads its structure and probes every link on it.

use crate::config::HttpConfig;
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::parser::parse_document;
use crate::crawler::prober::{is_broken_status, LinkProber, ProbeResult};
use crate::crawler::AnalyzeError;
use crate::model::{AnalysisRecord, BrokenLink, JobStatus};
use crate::url::{classify_link, resolve_link, should_skip, LinkKind};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs single-page analyses with a shared HTTP client
#[derive(Debug, Clone)]
pub struct PageAnalyzer {
    client: Client,
    prober: LinkProber,
}

impl PageAnalyzer {
    /// Creates an analyzer from HTTP configuration
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(
            client,
            Duration::from_secs(config.probe_timeout_secs),
        ))
    }

    /// Creates an analyzer around an existing client
    pub fn with_client(client: Client, probe_timeout: Duration) -> Self {
        let prober = LinkProber::new(client.clone(), probe_timeout);
        Self { client, prober }
    }

    /// Analyzes the page at `url`
    ///
    /// # Flow
    ///
    /// 1. Fetch the page (cancelable)
    /// 2. Parse the document; read title, heading counts and login form
    /// 3. Label the HTML version from the response protocol
    /// 4. For each anchor that is not empty or fragment-only: resolve it,
    ///    classify it internal/external, probe it and tally the outcome
    ///
    /// If `token` fires during step 4 the loop stops and the links already
    /// probed stay counted; the partial record is still returned as `Ok`.
    /// The returned record has status `done` and an empty id.
    ///
    /// # Errors
    ///
    /// Fetch and parse failures end the analysis. Failed probes never do;
    /// they are recorded as broken links.
    pub async fn analyze(
        &self,
        url: &str,
        token: &CancellationToken,
    ) -> Result<AnalysisRecord, AnalyzeError> {
        let page = fetch_page(&self.client, url, token).await?;

        let parsed = parse_document(&page.body).map_err(|message| AnalyzeError::Parse {
            url: url.to_string(),
            message,
        })?;

        let mut record = AnalysisRecord::new("", url, JobStatus::Done);
        record.title = parsed.title;
        record.html_version = page.html_version.to_string();
        record.headings = parsed.headings;
        record.has_login_form = parsed.has_login_form;

        let total = parsed.hrefs.len();
        let mut processed = 0usize;

        for href in &parsed.hrefs {
            if token.is_cancelled() {
                break;
            }

            if should_skip(href) {
                continue;
            }

            let absolute = resolve_link(url, href);
            let kind = classify_link(url, &absolute);

            let outcome = self.prober.probe(&absolute, token).await;
            let Some(status) = outcome.status_code() else {
                // Cancelled mid-probe: this link is not counted
                break;
            };

            if let ProbeResult::Failed(reason) = &outcome {
                tracing::debug!("Probe of {} failed: {}", absolute, reason);
            } else {
                tracing::debug!("Probe of {} returned {}", absolute, status);
            }

            match kind {
                LinkKind::Internal => record.internal_links += 1,
                LinkKind::External => record.external_links += 1,
            }

            if is_broken_status(status) {
                record.broken_links.push(BrokenLink {
                    url: absolute,
                    status,
                });
            } else {
                record.accessible_links += 1;
            }

            processed += 1;
        }

        if token.is_cancelled() {
            tracing::info!(
                "Analysis of {} cancelled after {} links ({} anchors on page)",
                url,
                processed,
                total
            );
        } else {
            tracing::info!(
                "Analyzed {}: {} internal, {} external, {} broken",
                url,
                record.internal_links,
                record.external_links,
                record.broken_links.len()
            );
        }

        Ok(record)
    }
}
