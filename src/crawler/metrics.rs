//! Page structure metrics
//!
//! Computes the structural counts of a parsed page: title, HTML version label,
//! heading counts, internal/external link split and login form presence.
//! Missing elements yield zero or empty values; this never fails.

use crate::crawler::extractor::resolve_href;
use crate::url::same_authority;
use scraper::{Html, Node, Selector};
use serde::Serialize;
use url::Url;

/// Label reported when doctype detection is not enabled
pub const DEFAULT_HTML_VERSION: &str = "HTML5";

/// Label reported by doctype detection when the document has no doctype
pub const UNKNOWN_HTML_VERSION: &str = "Unknown";

/// Structural metrics of one crawled page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetrics {
    /// Trimmed text of the first `<title>`, empty if absent
    pub title: String,
    pub html_version: String,
    pub h1_count: u32,
    pub h2_count: u32,
    pub h3_count: u32,
    pub h4_count: u32,
    pub h5_count: u32,
    pub h6_count: u32,
    /// Anchors whose resolved href shares the base URL's authority
    pub internal_links: u32,
    /// All other resolvable anchors
    pub external_links: u32,
    pub login_form_found: bool,
}

impl PageMetrics {
    /// Returns the count for heading level 1 through 6
    pub fn heading_count(&self, level: u8) -> Option<u32> {
        match level {
            1 => Some(self.h1_count),
            2 => Some(self.h2_count),
            3 => Some(self.h3_count),
            4 => Some(self.h4_count),
            5 => Some(self.h5_count),
            6 => Some(self.h6_count),
            _ => None,
        }
    }
}

/// Analyzes a parsed document with the constant HTML version label
pub fn analyze(document: &Html, base_url: &Url) -> PageMetrics {
    analyze_with(document, base_url, false)
}

/// Analyzes a parsed document
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `base_url` - The URL relative hrefs resolve against
/// * `sniff_doctype` - Detect the HTML version from the doctype instead of
///   reporting the constant label
pub fn analyze_with(document: &Html, base_url: &Url, sniff_doctype: bool) -> PageMetrics {
    let html_version = if sniff_doctype {
        detect_html_version(document)
    } else {
        DEFAULT_HTML_VERSION.to_string()
    };

    let (internal_links, external_links) = count_links(document, base_url);

    PageMetrics {
        title: extract_title(document),
        html_version,
        h1_count: count_elements(document, "h1"),
        h2_count: count_elements(document, "h2"),
        h3_count: count_elements(document, "h3"),
        h4_count: count_elements(document, "h4"),
        h5_count: count_elements(document, "h5"),
        h6_count: count_elements(document, "h6"),
        internal_links,
        external_links,
        login_form_found: has_login_form(document),
    }
}

/// Extracts the trimmed text of the first `<title>` element
fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn count_elements(document: &Html, selector: &str) -> u32 {
    Selector::parse(selector)
        .map(|selector| document.select(&selector).count() as u32)
        .unwrap_or(0)
}

/// Splits anchors into (internal, external) by authority
///
/// Empty, fragment-only and unresolvable hrefs are in neither count.
fn count_links(document: &Html, base_url: &Url) -> (u32, u32) {
    let Ok(selector) = Selector::parse("a[href]") else {
        return (0, 0);
    };

    let mut internal = 0;
    let mut external = 0;

    for href in document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
    {
        let Some(resolved) = resolve_href(base_url, href) else {
            continue;
        };

        if same_authority(&resolved, base_url) {
            internal += 1;
        } else {
            external += 1;
        }
    }

    (internal, external)
}

/// Returns true if any form contains a password input
fn has_login_form(document: &Html) -> bool {
    let (Ok(form_selector), Ok(input_selector)) =
        (Selector::parse("form"), Selector::parse("input[type]"))
    else {
        return false;
    };

    document.select(&form_selector).any(|form| {
        form.select(&input_selector).any(|input| {
            input
                .value()
                .attr("type")
                .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("password"))
        })
    })
}

/// Detects the HTML version label from the document's doctype
///
/// | Doctype | Label |
/// |---------|-------|
/// | `<!DOCTYPE html>` (no public id) | `HTML5` |
/// | XHTML 1.1 | `XHTML 1.1` |
/// | XHTML 1.0 Strict/Transitional/Frameset | `XHTML 1.0 <variant>` |
/// | HTML 4.01 Strict/Transitional/Frameset | `HTML 4.01 <variant>` |
/// | other public id | the public id |
/// | none | `Unknown` |
pub fn detect_html_version(document: &Html) -> String {
    let doctype = document.tree.root().children().find_map(|node| match node.value() {
        Node::Doctype(doctype) => Some(doctype),
        _ => None,
    });

    match doctype {
        Some(doctype) => doctype_label(doctype.public_id()),
        None => UNKNOWN_HTML_VERSION.to_string(),
    }
}

fn doctype_label(public_id: &str) -> String {
    const KNOWN: &[(&str, &str)] = &[
        ("XHTML 1.1", "XHTML 1.1"),
        ("XHTML 1.0 STRICT", "XHTML 1.0 Strict"),
        ("XHTML 1.0 TRANSITIONAL", "XHTML 1.0 Transitional"),
        ("XHTML 1.0 FRAMESET", "XHTML 1.0 Frameset"),
        ("HTML 4.01 TRANSITIONAL", "HTML 4.01 Transitional"),
        ("HTML 4.01 FRAMESET", "HTML 4.01 Frameset"),
        ("HTML 4.01", "HTML 4.01 Strict"),
    ];

    let public_id = public_id.trim();
    if public_id.is_empty() {
        return DEFAULT_HTML_VERSION.to_string();
    }

    let upper = public_id.to_ascii_uppercase();
    KNOWN
        .iter()
        .find(|(needle, _)| upper.contains(needle))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| public_id.to_string())
}
