//! Storage module for persisting crawl targets and results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Crawl target records and their latest metrics
//! - Broken-link details of the most recent successful crawl
//! - Paged, sorted listings

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::CrawlState;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default page number for listings
pub const DEFAULT_PAGE: u32 = 1;

/// Default number of records per listing page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest accepted listing page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Stores a URL unless it is already stored
///
/// # Returns
///
/// The record ID and whether a new record was created
pub fn insert_or_get_url<S: Storage + ?Sized>(
    storage: &mut S,
    url: &str,
) -> StorageResult<(i64, bool)> {
    if let Some(existing) = storage.get_url_by_address(url)? {
        return Ok((existing.id, false));
    }

    let id = storage.insert_url(url)?;
    Ok((id, true))
}

/// A stored crawl target with the metrics of its latest crawl
#[derive(Debug, Clone, Serialize)]
pub struct UrlRecord {
    pub id: i64,
    pub url: String,
    pub status: CrawlState,
    pub title: Option<String>,
    pub html_version: Option<String>,
    pub h1_count: u32,
    pub h2_count: u32,
    pub h3_count: u32,
    pub h4_count: u32,
    pub h5_count: u32,
    pub h6_count: u32,
    pub internal_links: u32,
    pub external_links: u32,
    pub broken_links: u32,
    pub login_form_found: bool,
    pub created_at: String,
    pub updated_at: String,

    /// Only filled for single-record lookups
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub broken_link_details: Vec<BrokenLinkRecord>,
}

impl UrlRecord {
    /// Heading counts in level order, h1 first
    pub fn heading_counts(&self) -> [u32; 6] {
        [
            self.h1_count,
            self.h2_count,
            self.h3_count,
            self.h4_count,
            self.h5_count,
            self.h6_count,
        ]
    }
}

/// One broken link found on a stored page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLinkRecord {
    pub link: String,
    pub status: String,
}

/// Columns a listing may be sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Url,
    Status,
    Title,
    HtmlVersion,
    H1Count,
    H2Count,
    H3Count,
    H4Count,
    H5Count,
    H6Count,
    InternalLinks,
    ExternalLinks,
    BrokenLinks,
    LoginFormFound,
    CreatedAt,
}

impl SortField {
    /// Every accepted field, in column order
    pub const ALL: [SortField; 16] = [
        Self::Id,
        Self::Url,
        Self::Status,
        Self::Title,
        Self::HtmlVersion,
        Self::H1Count,
        Self::H2Count,
        Self::H3Count,
        Self::H4Count,
        Self::H5Count,
        Self::H6Count,
        Self::InternalLinks,
        Self::ExternalLinks,
        Self::BrokenLinks,
        Self::LoginFormFound,
        Self::CreatedAt,
    ];

    /// The column name, safe to splice into SQL
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Url => "url",
            Self::Status => "status",
            Self::Title => "title",
            Self::HtmlVersion => "html_version",
            Self::H1Count => "h1_count",
            Self::H2Count => "h2_count",
            Self::H3Count => "h3_count",
            Self::H4Count => "h4_count",
            Self::H5Count => "h5_count",
            Self::H6Count => "h6_count",
            Self::InternalLinks => "internal_links",
            Self::ExternalLinks => "external_links",
            Self::BrokenLinks => "broken_links",
            Self::LoginFormFound => "login_form_found",
            Self::CreatedAt => "created_at",
        }
    }
}

impl FromStr for SortField {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.column() == s)
            .ok_or_else(|| StorageError::InvalidQuery(format!("unknown sort field '{}'", s)))
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Listing sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// The SQL keyword
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(StorageError::InvalidQuery(format!(
                "unknown sort order '{}', expected asc or desc",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// Paging and sorting for a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortField,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl ListQuery {
    /// Builds a query, replacing out-of-range paging values with defaults
    pub fn new(page: u32, page_size: u32, sort_by: SortField, order: SortOrder) -> Self {
        let page = if page >= 1 { page } else { DEFAULT_PAGE };
        let page_size = if (1..=MAX_PAGE_SIZE).contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };

        Self {
            page,
            page_size,
            sort_by,
            order,
        }
    }

    /// Number of rows skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct UrlPage {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub urls: Vec<UrlRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_roundtrip() {
        for field in SortField::ALL {
            let parsed: SortField = field.column().parse().unwrap();
            assert_eq!(field, parsed);
        }
    }

    #[test]
    fn test_sort_field_rejects_unknown() {
        assert!("password".parse::<SortField>().is_err());
        assert!("id; DROP TABLE urls".parse::<SortField>().is_err());
        assert!("".parse::<SortField>().is_err());
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("ASC".parse::<SortOrder>().is_err());
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_default_query() {
        let query = ListQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 10);
        assert_eq!(query.sort_by, SortField::CreatedAt);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_query_paging_falls_back_to_defaults() {
        let query = ListQuery::new(0, 0, SortField::Id, SortOrder::Asc);
        assert_eq!(query.page, DEFAULT_PAGE);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);

        let query = ListQuery::new(3, 101, SortField::Id, SortOrder::Asc);
        assert_eq!(query.page, 3);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);

        let query = ListQuery::new(3, 25, SortField::Id, SortOrder::Asc);
        assert_eq!(query.offset(), 50);
    }

    #[test]
    fn test_insert_or_get_url_reuses_existing_record() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let (id, created) = insert_or_get_url(&mut storage, "https://example.com/").unwrap();
        assert!(created);

        let (again, created) = insert_or_get_url(&mut storage, "https://example.com/").unwrap();
        assert!(!created);
        assert_eq!(again, id);

        let (other, created) = insert_or_get_url(&mut storage, "https://other.example/").unwrap();
        assert!(created);
        assert_ne!(other, id);
    }
}
