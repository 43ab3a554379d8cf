//! HTTP fetcher implementation
//!
//! This module handles the page request of an analysis:
//! - Building the shared HTTP client from configuration
//! - GET requests that abort as soon as the job is cancelled
//! - Mapping the response protocol version to an HTML version label

use crate::config::HttpConfig;
use crate::crawler::AnalyzeError;
use reqwest::{Client, Version};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A fetched page, ready for parsing
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Label derived from the response protocol version
    pub html_version: &'static str,
    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use page_lens::config::HttpConfig;
/// use page_lens::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Derives the HTML version label from the response protocol version
///
/// This is a heuristic keyed off the transport, not the document doctype:
///
/// | Protocol | Label |
/// |----------|-------|
/// | HTTP/1.0 | `HTML 4.01` |
/// | HTTP/1.1 | `XHTML or HTML 4.01` |
/// | HTTP/2 | `HTML5` |
/// | anything else | `Unknown` |
pub fn detect_html_version(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "HTML 4.01"
    } else if version == Version::HTTP_11 {
        "XHTML or HTML 4.01"
    } else if version == Version::HTTP_2 {
        "HTML5"
    } else {
        "Unknown"
    }
}

/// Fetches a page, aborting promptly if `token` is cancelled
///
/// The response status is not checked: error pages are analyzed like any
/// other document.
///
/// # Errors
///
/// * `AnalyzeError::Transport` - DNS, connection, TLS or timeout failure
/// * `AnalyzeError::Parse` - the body could not be read
/// * `AnalyzeError::Cancelled` - the token fired before the body arrived
pub async fn fetch_page(
    client: &Client,
    url: &str,
    token: &CancellationToken,
) -> Result<FetchedPage, AnalyzeError> {
    let response = tokio::select! {
        biased;
        _ = token.cancelled() => {
            return Err(AnalyzeError::Cancelled { url: url.to_string() });
        }
        result = client.get(url).send() => result.map_err(|source| AnalyzeError::Transport {
            url: url.to_string(),
            source,
        })?,
    };

    let final_url = response.url().to_string();
    let status_code = response.status().as_u16();
    let html_version = detect_html_version(response.version());

    tracing::debug!(
        "Fetched {} -> {} ({:?}, HTTP {})",
        url,
        final_url,
        response.version(),
        status_code
    );

    let body = tokio::select! {
        biased;
        _ = token.cancelled() => {
            return Err(AnalyzeError::Cancelled { url: url.to_string() });
        }
        result = response.text() => result.map_err(|e| AnalyzeError::Parse {
            url: url.to_string(),
            message: format!("unreadable body: {}", e),
        })?,
    };

    Ok(FetchedPage {
        final_url,
        status_code,
        html_version,
        body,
    })
}
