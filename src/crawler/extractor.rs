//! Link extraction
//!
//! Produces the outgoing links of a parsed page, resolved to absolute form
//! against the page's base URL, in document order.

use crate::url::is_http;
use scraper::{Html, Selector};
use url::Url;

/// Extracts every verifiable outgoing link from the document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` with a non-empty, non-fragment-only value, resolved
///   against `base_url`
///
/// **Exclude:**
/// - Missing, empty or whitespace-only `href`
/// - Fragment-only anchors (`#`, `#section`)
/// - Hrefs that fail to resolve (skipped, never fatal)
/// - Non-HTTP(S) results (`mailto:`, `tel:`, `javascript:`, `data:`)
///
/// Duplicates are kept; the verifier checks each distinct URL once.
///
/// # Example
///
/// ```
/// use page_sentry::crawler::extract_links;
/// use scraper::Html;
/// use url::Url;
///
/// let document = Html::parse_document(r##"<a href="/docs">Docs</a><a href="#top">Top</a>"##);
/// let base = Url::parse("https://example.com/page").unwrap();
/// assert_eq!(extract_links(&document, &base), vec!["https://example.com/docs"]);
/// ```
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_href(base_url, href))
        .filter(is_http)
        .map(String::from)
        .collect()
}

/// Resolves an anchor's href against the base URL
///
/// Returns None for empty and fragment-only hrefs and for hrefs that do not
/// resolve to a valid URL.
pub(crate) fn resolve_href(base_url: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    base_url.join(href).ok()
}
