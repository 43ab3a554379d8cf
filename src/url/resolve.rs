use url::Url;

/// Returns true for anchors that are never counted: empty or fragment-only
///
/// The href is checked as written in the document.
pub fn should_skip(href: &str) -> bool {
    href.is_empty() || href.starts_with('#')
}

/// Resolves a link href against the page URL
///
/// Standard URI reference resolution is applied. If the base or the
/// reference cannot be parsed, the href is returned unchanged.
///
/// # Examples
///
/// ```
/// use page_lens::url::resolve_link;
///
/// assert_eq!(
///     resolve_link("https://example.com/docs/", "../about"),
///     "https://example.com/about"
/// );
/// assert_eq!(resolve_link("not a base", "/about"), "/about");
/// ```
pub fn resolve_link(base_url: &str, href: &str) -> String {
    let Ok(base) = Url::parse(base_url) else {
        return href.to_string();
    };

    match base.join(href) {
        Ok(absolute) => absolute.to_string(),
        Err(e) => {
            tracing::debug!("Could not resolve {} against {}: {}", href, base_url, e);
            href.to_string()
        }
    }
}
