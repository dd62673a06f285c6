//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::CrawlOutcome;
use crate::state::CrawlState;
use crate::storage::{BrokenLinkRecord, ListQuery, UrlPage, UrlRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("URL not found: {0}")]
    UrlNotFound(i64),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed to keep crawl targets
/// and the results of their latest crawl.
pub trait Storage {
    // ===== URL Management =====

    /// Stores a new crawl target with status `pending`
    ///
    /// # Arguments
    ///
    /// * `url` - The validated absolute URL
    ///
    /// # Returns
    ///
    /// The ID of the new record. A URL that is already stored is a
    /// `ConstraintViolation`.
    fn insert_url(&mut self, url: &str) -> StorageResult<i64>;

    /// Gets a record by ID, broken-link details included
    fn get_url(&self, id: i64) -> StorageResult<UrlRecord>;

    /// Gets a record by its exact URL
    fn get_url_by_address(&self, url: &str) -> StorageResult<Option<UrlRecord>>;

    /// Lists one page of records, sorted as requested
    ///
    /// Records in the listing do not carry broken-link details.
    fn list_urls(&self, query: &ListQuery) -> StorageResult<UrlPage>;

    /// Deletes a record and its broken links
    fn delete_url(&mut self, id: i64) -> StorageResult<()>;

    // ===== Crawl Results =====

    /// Sets the status of a record without touching its metrics
    fn update_status(&mut self, id: i64, state: &CrawlState) -> StorageResult<()>;

    /// Persists a crawl outcome atomically
    ///
    /// On `done` the metrics are written and the broken-link set is
    /// replaced by the new one. On failure only the status is written.
    fn save_outcome(&mut self, id: i64, outcome: &CrawlOutcome) -> StorageResult<()>;

    /// Gets the broken links recorded for a record, sorted by link
    fn broken_links_for(&self, id: i64) -> StorageResult<Vec<BrokenLinkRecord>>;
}
