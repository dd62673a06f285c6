//! Single-page crawl orchestration
//!
//! Fetches the target page, analyzes it, extracts its links and hands them
//! to the verifier. Nothing here touches storage; the caller decides what to
//! persist from the returned [`CrawlOutcome`].

use crate::config::Config;
use crate::crawler::extractor::extract_links;
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchResult};
use crate::crawler::metrics::{analyze_with, PageMetrics};
use crate::crawler::verifier::LinkVerifier;
use crate::state::CrawlState;
use crate::SentryError;
use reqwest::Client;
use scraper::Html;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A link that failed verification, with its failure status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCheckOutcome {
    /// Absolute URL of the link
    pub url: String,

    /// Status line (`404 Not Found`) or transport error text
    pub status: String,
}

/// Result of crawling one page
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    /// The URL that was requested
    pub target: String,

    /// Terminal state: `done` or one of the failure descriptors
    pub state: CrawlState,

    /// Page metrics; present only when the page was fetched and analyzed
    pub metrics: Option<PageMetrics>,

    /// Number of verifiable links extracted, duplicates included
    pub links_found: usize,

    /// Broken links sorted by URL
    pub broken_links: Vec<LinkCheckOutcome>,

    /// Non-fatal problems met during verification
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CrawlOutcome {
    fn failed(target: &Url, state: CrawlState) -> Self {
        Self {
            target: target.to_string(),
            state,
            metrics: None,
            links_found: 0,
            broken_links: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns true if the page was fetched and analyzed
    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }
}

/// Runs single-page crawls with a shared client and verifier
#[derive(Debug, Clone)]
pub struct Crawler {
    client: Client,
    verifier: LinkVerifier,
    page_timeout: Duration,
    sniff_doctype: bool,
}

impl Crawler {
    /// Creates a crawler from configuration, building its HTTP client
    pub fn new(config: &Config) -> Result<Self, SentryError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a crawler around an existing client
    pub fn with_client(client: Client, config: &Config) -> Self {
        let verifier = LinkVerifier::new(
            client.clone(),
            config.crawler.workers as usize,
            config.crawler.link_timeout(),
        );

        Self {
            client,
            verifier,
            page_timeout: config.crawler.page_timeout(),
            sniff_doctype: config.crawler.sniff_doctype,
        }
    }

    /// Returns the link verifier used by this crawler
    pub fn verifier(&self) -> &LinkVerifier {
        &self.verifier
    }

    /// Crawls one page and verifies its links
    pub async fn crawl(&self, target: &Url) -> CrawlOutcome {
        self.crawl_with_cancel(target, CancellationToken::new()).await
    }

    /// Crawls one page, abandoning link verification if `cancel` fires
    ///
    /// A cancelled crawl is still `done`: the page was analyzed and the
    /// outcome holds whatever broken links were found before cancellation.
    pub async fn crawl_with_cancel(&self, target: &Url, cancel: CancellationToken) -> CrawlOutcome {
        tracing::info!("Crawling {}", target);

        let (final_url, body) = match fetch_page(&self.client, target, self.page_timeout).await {
            FetchResult::Success {
                final_url,
                status_code,
                body,
            } => {
                tracing::debug!(
                    "Fetched {} ({}, {} bytes, final URL {})",
                    target,
                    status_code,
                    body.len(),
                    final_url
                );
                (final_url, body)
            }
            FetchResult::HttpError {
                status_code,
                status_line,
            } => {
                tracing::warn!("Fetching {} returned {}", target, status_line);
                return CrawlOutcome::failed(target, CrawlState::failed_with_status(status_code));
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Fetching {} failed: {}", target, error);
                return CrawlOutcome::failed(target, CrawlState::failed_with_error(error));
            }
            FetchResult::BodyError { status_code, error } => {
                tracing::warn!(
                    "Reading body of {} ({}) failed: {}",
                    target,
                    status_code,
                    error
                );
                return CrawlOutcome::failed(target, CrawlState::failed_with_error(error));
            }
        };

        // Html is not Send; it must be gone before the verifier await
        let (metrics, links) = {
            let document = Html::parse_document(&body);
            let metrics = analyze_with(&document, &final_url, self.sniff_doctype);
            let links = extract_links(&document, &final_url);
            (metrics, links)
        };

        tracing::debug!(
            "{}: {} internal, {} external, {} verifiable link(s)",
            target,
            metrics.internal_links,
            metrics.external_links,
            links.len()
        );

        let links_found = links.len();
        let report = self.verifier.verify_with_cancel(links, cancel).await;

        for warning in &report.warnings {
            tracing::warn!("{}: {}", target, warning);
        }
        let warnings = report.warnings.clone();

        CrawlOutcome {
            target: target.to_string(),
            state: CrawlState::Done,
            metrics: Some(metrics),
            links_found,
            broken_links: report.into_outcomes(),
            warnings,
        }
    }
}
