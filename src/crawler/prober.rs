//! Link prober
//!
//! Each resolved link gets one HEAD request. Link health is data: transport
//! failures become a synthetic status instead of an error.

use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Status recorded for a link whose probe failed before any response
pub const PROBE_FAILURE_STATUS: u16 = 500;

/// Returns true if a probe status marks the link as broken
pub fn is_broken_status(status: u16) -> bool {
    status >= 400
}

/// Outcome of probing a single link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The remote answered with this status code
    Status(u16),

    /// Timeout, DNS failure, refused connection and the like
    Failed(String),

    /// The job was cancelled while the probe was in flight
    Cancelled,
}

impl ProbeResult {
    /// Status code to record, or None if the link should not be counted
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            Self::Failed(_) => Some(PROBE_FAILURE_STATUS),
            Self::Cancelled => None,
        }
    }

    pub fn is_broken(&self) -> bool {
        self.status_code().is_some_and(is_broken_status)
    }
}

/// Issues lightweight existence checks against links
#[derive(Debug, Clone)]
pub struct LinkProber {
    client: Client,
    timeout: Duration,
}

impl LinkProber {
    /// Creates a prober sharing `client`, with a per-probe timeout
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Sends a HEAD request to `url`
    ///
    /// Cancellation aborts the in-flight request rather than waiting for the
    /// timeout.
    pub async fn probe(&self, url: &str, token: &CancellationToken) -> ProbeResult {
        if token.is_cancelled() {
            return ProbeResult::Cancelled;
        }

        let request = self.client.head(url).timeout(self.timeout).send();

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return ProbeResult::Cancelled,
            result = request => result,
        };

        match result {
            Ok(response) => ProbeResult::Status(response.status().as_u16()),
            Err(e) => ProbeResult::Failed(describe_error(&e)),
        }
    }
}

/// Short description of a failed probe for logs
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection failed".to_string()
    } else if error.is_builder() {
        format!("Invalid link: {}", error)
    } else {
        error.to_string()
    }
}
