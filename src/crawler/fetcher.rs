//! HTTP fetcher implementation
//!
//! This module handles the top-level page request for a crawl, including:
//! - Building the shared HTTP client with a proper user agent string
//! - Fetching the target page with a per-request timeout
//! - Classifying the outcome (success, non-2xx status, transport failure)

use crate::config::Config;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Result of a page fetch
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// The server answered with a non-2xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
        /// Status line as reported, e.g. `500 Internal Server Error`
        status_line: String,
    },

    /// Network error (connection refused, DNS failure, timeout, ...)
    NetworkError {
        /// Error description
        error: String,
    },

    /// Response headers arrived but the body could not be read or decoded
    BodyError {
        /// The HTTP status code of the response
        status_code: u16,
        /// Error description
        error: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// The client is shared by the page fetch and by every link verification
/// worker; request timeouts are applied per request, so the client itself
/// only carries a connect timeout.
///
/// # Arguments
///
/// * `config` - The full configuration (user agent and crawler sections)
///
/// # Example
///
/// ```no_run
/// use page_sentry::config::Config;
/// use page_sentry::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let redirect = match config.crawler.max_redirects {
        0 => Policy::none(),
        hops => Policy::limited(hops as usize),
    };

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .connect_timeout(config.crawler.link_timeout().min(Duration::from_secs(10)))
        .redirect(redirect)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches the crawl target with a GET request
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The page to fetch
/// * `timeout` - Bound on the whole request, body included
///
/// # Returns
///
/// A FetchResult indicating success or the type of failure
pub async fn fetch_page(client: &Client, url: &Url, timeout: Duration) -> FetchResult {
    let response = match client.get(url.clone()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            return FetchResult::NetworkError {
                error: error_text(&e),
            }
        }
    };

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            status_line: status.to_string(),
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => FetchResult::BodyError {
            status_code: status.as_u16(),
            error: error_text(&e),
        },
    }
}

/// Renders a reqwest error as status text
///
/// Never returns an empty string, so a failure always carries a description.
pub(crate) fn error_text(error: &reqwest::Error) -> String {
    let text = if error.is_timeout() {
        format!("request timed out: {}", error)
    } else {
        error.to_string()
    };

    if text.trim().is_empty() {
        "error".to_string()
    } else {
        text
    }
}
