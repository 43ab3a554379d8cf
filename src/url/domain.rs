use url::Url;

/// Extracts the hostname from a URL
///
/// The host is returned lowercased and without a port. URLs with no host
/// (`mailto:`, `data:` and the like) yield `None`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_lens::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("mailto:someone@example.com").unwrap();
/// assert_eq!(extract_host(&url), None);
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `link` points at the same host as `base_url`
///
/// Only hostnames are compared; scheme and port are ignored. If either
/// string fails to parse as an absolute URL the link is not internal.
pub fn is_internal(base_url: &str, link: &str) -> bool {
    let (Ok(base), Ok(dest)) = (Url::parse(base_url), Url::parse(link)) else {
        return false;
    };
    extract_host(&base) == extract_host(&dest)
}
