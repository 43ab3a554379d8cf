//! Link resolution and classification
//!
//! Anchors found on a page are resolved against the page URL and classified
//! as internal or external by hostname.

mod domain;
mod resolve;

// Re-export main functions
pub use domain::{extract_host, is_internal};
pub use resolve::{resolve_link, should_skip};

/// Which side of the host boundary a link falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Same hostname as the analyzed page
    Internal,
    /// Any other hostname, or a link that could not be parsed
    External,
}

/// Classifies an already-resolved link against the page URL
///
/// # Examples
///
/// ```
/// use page_lens::url::{classify_link, LinkKind};
///
/// assert_eq!(
///     classify_link("https://example.com/", "https://example.com/about"),
///     LinkKind::Internal
/// );
/// assert_eq!(
///     classify_link("https://example.com/", "https://other.example/x"),
///     LinkKind::External
/// );
/// ```
pub fn classify_link(base_url: &str, absolute_url: &str) -> LinkKind {
    if is_internal(base_url, absolute_url) {
        LinkKind::Internal
    } else {
        LinkKind::External
    }
}
