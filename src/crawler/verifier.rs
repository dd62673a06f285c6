//! Concurrent link verification
//!
//! A fixed pool of workers drains a shared queue of URLs. Each URL gets a
//! lightweight HEAD probe; when the probe errors or answers with a status
//! of 400 or above, the worker falls back to a full GET before deciding.
//! A link is broken only if both attempts fail.
//!
//! Only failures are reported. A link that passes either attempt produces no
//! result at all, so an empty report means every link was reachable.

use crate::crawler::fetcher::error_text;
use crate::crawler::LinkCheckOutcome;
use reqwest::{Client, RequestBuilder};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Default number of concurrent verification workers
pub const DEFAULT_WORKERS: usize = 10;

/// Default bound on each probe and each fallback request
pub const DEFAULT_LINK_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one verification batch
#[derive(Debug, Default)]
pub struct VerificationReport {
    /// Broken links keyed by URL, each with its failure status
    pub broken: HashMap<String, String>,

    /// Number of distinct URLs whose check ran to completion
    pub checked: usize,

    /// Number of distinct URLs submitted
    pub submitted: usize,

    /// Batch-level problems (worker failures, cancellation)
    pub warnings: Vec<String>,

    /// True if the batch was cancelled before the queue drained
    pub cancelled: bool,
}

impl VerificationReport {
    /// Converts the broken-link map into outcomes sorted by URL
    pub fn into_outcomes(self) -> Vec<LinkCheckOutcome> {
        let mut outcomes: Vec<LinkCheckOutcome> = self
            .broken
            .into_iter()
            .map(|(url, status)| LinkCheckOutcome { url, status })
            .collect();
        outcomes.sort_by(|a, b| a.url.cmp(&b.url));
        outcomes
    }
}

/// Result of a single request attempt
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attempt {
    /// The server answered
    Response { status_code: u16, status_line: String },
    /// The request failed before a response arrived
    Transport(String),
}

impl Attempt {
    fn is_failure(&self) -> bool {
        match self {
            Self::Response { status_code, .. } => *status_code >= 400,
            Self::Transport(_) => true,
        }
    }
}

/// Verifies links with a bounded pool of concurrent workers
#[derive(Debug, Clone)]
pub struct LinkVerifier {
    client: Client,
    workers: usize,
    timeout: Duration,
}

impl LinkVerifier {
    /// Creates a verifier
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (cheap to clone)
    /// * `workers` - Pool size; zero is treated as one
    /// * `timeout` - Bound on each individual probe or fallback request
    pub fn new(client: Client, workers: usize, timeout: Duration) -> Self {
        Self {
            client,
            workers: workers.max(1),
            timeout,
        }
    }

    /// Returns the pool size
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Checks every URL and returns the broken ones
    ///
    /// Blocks until every URL has been checked. Duplicate URLs are checked
    /// once. An empty input returns an empty report without starting workers.
    pub async fn verify(&self, urls: Vec<String>) -> VerificationReport {
        self.verify_with_cancel(urls, CancellationToken::new()).await
    }

    /// Checks every URL until done or until `cancel` fires
    ///
    /// On cancellation workers stop taking URLs and abandon in-flight
    /// requests; the report keeps whatever broken links were already found.
    pub async fn verify_with_cancel(
        &self,
        urls: Vec<String>,
        cancel: CancellationToken,
    ) -> VerificationReport {
        let mut seen = HashSet::new();
        let unique: Vec<String> = urls
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect();

        let mut report = VerificationReport {
            submitted: unique.len(),
            ..VerificationReport::default()
        };

        if unique.is_empty() {
            return report;
        }

        tracing::info!(
            "Verifying {} link(s) with {} worker(s)",
            unique.len(),
            self.workers
        );

        // Shared work queue, filled up front and closed
        let (work_tx, work_rx) = mpsc::unbounded_channel::<String>();
        for url in unique {
            // The receiver is held below, so sending cannot fail
            let _ = work_tx.send(url);
        }
        drop(work_tx);
        let queue = Arc::new(Mutex::new(work_rx));

        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<LinkCheckOutcome>();

        let mut pool = JoinSet::new();
        for worker_id in 0..self.workers {
            let worker = Worker {
                id: worker_id,
                client: self.client.clone(),
                timeout: self.timeout,
                queue: Arc::clone(&queue),
                results: result_tx.clone(),
                cancel: cancel.clone(),
            };
            pool.spawn(worker.run());
        }
        drop(result_tx);

        // Ends once every worker has dropped its sender
        while let Some(outcome) = result_rx.recv().await {
            tracing::debug!("Broken link found: {} ({})", outcome.url, outcome.status);
            report.broken.insert(outcome.url, outcome.status);
        }

        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(checked) => report.checked += checked,
                Err(e) => report.warnings.push(format!("link worker failed: {}", e)),
            }
        }

        if cancel.is_cancelled() {
            report.cancelled = true;
            report.warnings.push(format!(
                "verification cancelled after {} of {} link(s)",
                report.checked, report.submitted
            ));
        }

        tracing::info!(
            "Link verification finished: {} checked, {} broken",
            report.checked,
            report.broken.len()
        );

        report
    }
}

/// One member of the verification pool
struct Worker {
    id: usize,
    client: Client,
    timeout: Duration,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    results: mpsc::UnboundedSender<LinkCheckOutcome>,
    cancel: CancellationToken,
}

impl Worker {
    /// Drains the queue, returning how many URLs this worker finished
    async fn run(self) -> usize {
        let mut checked = 0;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let next = self.queue.lock().await.recv().await;
            let Some(url) = next else {
                break;
            };

            let status = tokio::select! {
                _ = self.cancel.cancelled() => break,
                status = check_link(&self.client, &url, self.timeout) => status,
            };

            checked += 1;
            if let Some(status) = status {
                if self.results.send(LinkCheckOutcome { url, status }).is_err() {
                    break;
                }
            }
        }

        tracing::trace!("Link worker {} exiting after {} check(s)", self.id, checked);
        checked
    }
}

/// Checks one URL: HEAD probe, then GET fallback if the probe fails
///
/// Returns None when the link is reachable, otherwise the failure status.
pub(crate) async fn check_link(client: &Client, url: &str, timeout: Duration) -> Option<String> {
    tracing::debug!("Checking link: {}", url);

    let probe = attempt(client.head(url).timeout(timeout)).await;
    if !probe.is_failure() {
        return None;
    }

    tracing::debug!("Probe failed for {}, falling back to GET", url);
    let fallback = attempt(client.get(url).timeout(timeout)).await;
    if !fallback.is_failure() {
        return None;
    }

    Some(describe_failure(&probe, &fallback))
}

async fn attempt(request: RequestBuilder) -> Attempt {
    match request.send().await {
        Ok(response) => {
            let status = response.status();
            Attempt::Response {
                status_code: status.as_u16(),
                status_line: status.to_string(),
            }
        }
        Err(e) => Attempt::Transport(error_text(&e)),
    }
}

/// Picks the status reported for a broken link
///
/// | Probe | Fallback | Reported |
/// |-------|----------|----------|
/// | any | response | fallback status line |
/// | response | transport error | fallback error text |
/// | transport error | transport error | probe error text |
fn describe_failure(probe: &Attempt, fallback: &Attempt) -> String {
    let status = match (probe, fallback) {
        (_, Attempt::Response { status_line, .. }) => status_line.clone(),
        (Attempt::Response { .. }, Attempt::Transport(error)) => error.clone(),
        (Attempt::Transport(error), Attempt::Transport(_)) => error.clone(),
    };

    if status.trim().is_empty() {
        "error".to_string()
    } else {
        status
    }
}
