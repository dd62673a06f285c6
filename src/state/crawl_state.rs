/// Crawl state definitions for stored URLs
///
/// The persisted form is a free-form status string, so failure states keep
/// their full descriptor (`failed with status 500`, `failed: <error>`).
use serde::{Serialize, Serializer};
use std::fmt;

/// Represents the current state of a stored URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// URL has been stored but never crawled
    Pending,

    /// A crawl is currently running for this URL
    Crawling,

    // ===== Terminal States =====
    /// Page fetched and analyzed, link verification attempted
    Done,

    /// Page fetch, or reading its body, failed
    Failed(String),
}

impl CrawlState {
    /// Builds the failure state for a non-2xx page response
    pub fn failed_with_status(status_code: u16) -> Self {
        Self::Failed(format!("failed with status {}", status_code))
    }

    /// Builds the failure state for a transport or body-read error
    pub fn failed_with_error(error: impl fmt::Display) -> Self {
        Self::Failed(format!("failed: {}", error))
    }

    /// Returns true if the crawl finished successfully
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if the crawl ended in a failure state
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Crawling => "crawling",
            Self::Done => "done",
            Self::Failed(descriptor) => descriptor,
        }
    }

    /// Parses a state from its database string representation
    ///
    /// Any string that is not one of the fixed states is a failure
    /// descriptor, so parsing never fails.
    pub fn from_db_string(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "crawling" => Self::Crawling,
            "done" => Self::Done,
            other => Self::Failed(other.to_string()),
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

impl Serialize for CrawlState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_db_string())
    }
}
