//! HTML parser for extracting page structure
//!
//! This module handles parsing HTML content to extract:
//! - Page title
//! - Heading counts for h1..h6
//! - Raw anchor hrefs, in document order
//! - Whether a login form is present

use crate::model::{HeadingCounts, HEADING_TAGS};
use scraper::{Html, Selector};

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    /// Text of the first <title> element, empty if absent
    pub title: String,

    /// Element count for every heading level
    pub headings: HeadingCounts,

    /// `href` values of all anchors, unresolved
    pub hrefs: Vec<String>,

    /// True if any password input sits inside a form
    pub has_login_form: bool,
}

/// Parses HTML content and extracts the page structure
///
/// Parsing is lenient: malformed markup still yields a document. An error
/// is returned only if a selector cannot be built.
///
/// # Example
///
/// ```
/// use page_lens::crawler::parse_document;
///
/// let html = r#"<html><head><title>Test</title></head><body><h1>A</h1><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_document(html).unwrap();
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.headings.get("h1"), 1);
/// assert_eq!(parsed.hrefs, vec!["/page".to_string()]);
/// ```
pub fn parse_document(html: &str) -> Result<ParsedPage, String> {
    let document = Html::parse_document(html);

    Ok(ParsedPage {
        title: extract_title(&document)?,
        headings: count_headings(&document)?,
        hrefs: extract_hrefs(&document)?,
        has_login_form: detect_login_form(&document)?,
    })
}

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector '{}': {:?}", css, e))
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Result<String, String> {
    let title_selector = selector("title")?;

    Ok(document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default())
}

/// Counts each heading level independently; absent levels count zero
fn count_headings(document: &Html) -> Result<HeadingCounts, String> {
    let mut headings = HeadingCounts::zeroed();

    for tag in HEADING_TAGS {
        let heading_selector = selector(tag)?;
        let count = document.select(&heading_selector).count();
        headings.set(tag, u32::try_from(count).unwrap_or(u32::MAX));
    }

    Ok(headings)
}

/// Collects anchor hrefs exactly as written
fn extract_hrefs(document: &Html) -> Result<Vec<String>, String> {
    let a_selector = selector("a[href]")?;

    Ok(document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect())
}

fn detect_login_form(document: &Html) -> Result<bool, String> {
    let password_selector = selector(r#"form input[type="password"]"#)?;
    Ok(document.select(&password_selector).next().is_some())
}
