use thiserror::Error;

/// Reasons a page analysis ends without a result
///
/// Link probe failures are not errors; they are recorded as broken links.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Failed to fetch {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Failed to parse document from {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Analysis of {url} was cancelled")]
    Cancelled { url: String },
}

impl AnalyzeError {
    /// Returns true if the run ended because its cancellation signal fired
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
