use url::Url;

/// Extracts the authority (lowercase host plus explicit port) from a URL
///
/// The scheme plays no part: `http://example.com` and `https://example.com`
/// share an authority. A port equal to the scheme's default is not explicit,
/// so `https://example.com:443` matches `https://example.com`. URLs without a
/// host (`mailto:`, `tel:`) have no authority.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_sentry::url::authority;
///
/// let url = Url::parse("https://Example.COM/path").unwrap();
/// assert_eq!(authority(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:8080/").unwrap();
/// assert_eq!(authority(&url), Some("localhost:8080".to_string()));
///
/// let url = Url::parse("mailto:someone@example.com").unwrap();
/// assert_eq!(authority(&url), None);
/// ```
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Returns true if both URLs have the same authority
///
/// A URL without an authority never matches.
pub fn same_authority(a: &Url, b: &Url) -> bool {
    match (authority(a), authority(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
