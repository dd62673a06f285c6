//! Crawler module for single-page analysis and link verification
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of the target page
//! - Page metrics and link extraction
//! - Concurrent verification of outgoing links
//! - Overall crawl orchestration

mod extractor;
mod fetcher;
mod metrics;
mod orchestrator;
mod verifier;

pub use extractor::extract_links;
pub use fetcher::{build_http_client, fetch_page, FetchResult};
pub use metrics::{
    analyze, analyze_with, detect_html_version, PageMetrics, DEFAULT_HTML_VERSION,
    UNKNOWN_HTML_VERSION,
};
pub use orchestrator::{CrawlOutcome, Crawler, LinkCheckOutcome};
pub use verifier::{LinkVerifier, VerificationReport, DEFAULT_LINK_TIMEOUT, DEFAULT_WORKERS};

use crate::state::CrawlState;
use crate::storage::{Storage, StorageError, UrlRecord};
use crate::url::parse_target;
use crate::SentryError;

/// Crawls a stored URL and persists the outcome
///
/// This is the main entry point for crawling a stored target. It will:
/// 1. Load the record
/// 2. Mark it `crawling`
/// 3. Fetch, analyze and verify the page
/// 4. Save the outcome in one transaction
///
/// # Arguments
///
/// * `storage` - The storage backend holding the record
/// * `crawler` - The crawler to run
/// * `id` - ID of the stored URL
///
/// # Returns
///
/// * `Ok(UrlRecord)` - The refreshed record after a successful crawl
/// * `Err(SentryError::NotFound)` - No record with this ID
/// * `Err(SentryError::CrawlFailed)` - The page could not be fetched; the
///   failure status has been saved
pub async fn run_crawl<S: Storage + ?Sized>(
    storage: &mut S,
    crawler: &Crawler,
    id: i64,
) -> Result<UrlRecord, SentryError> {
    let record = storage.get_url(id).map_err(|e| not_found(e, id))?;
    let target = parse_target(&record.url)?;

    storage
        .update_status(id, &CrawlState::Crawling)
        .map_err(|e| not_found(e, id))?;

    let outcome = crawler.crawl(&target).await;
    storage.save_outcome(id, &outcome)?;

    if !outcome.is_done() {
        tracing::warn!("Crawl of URL {} failed: {}", id, outcome.state);
        return Err(SentryError::CrawlFailed {
            url: record.url,
            reason: outcome.state.to_string(),
        });
    }

    tracing::info!(
        "Crawl of URL {} finished: {} broken link(s) out of {}",
        id,
        outcome.broken_links.len(),
        outcome.links_found
    );

    Ok(storage.get_url(id)?)
}

fn not_found(error: StorageError, id: i64) -> SentryError {
    match error {
        StorageError::UrlNotFound(_) => SentryError::NotFound { id },
        other => other.into(),
    }
}
