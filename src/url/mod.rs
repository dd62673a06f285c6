//! URL handling module for Page-Sentry
//!
//! This module validates crawl targets and compares URL authorities for the
//! internal/external link split.

mod domain;

pub use domain::{authority, same_authority};

use crate::UrlError;
use url::Url;

/// Parses and validates a crawl target
///
/// A crawl target must be an absolute `http` or `https` URL with a host.
///
/// # Examples
///
/// ```
/// use page_sentry::url::parse_target;
///
/// let url = parse_target("https://example.com/docs").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(parse_target("ftp://example.com/").is_err());
/// assert!(parse_target("/relative/path").is_err());
/// ```
pub fn parse_target(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Returns true if the URL uses a scheme the link verifier can retrieve
pub fn is_http(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}
