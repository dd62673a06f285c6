//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::CrawlOutcome;
use crate::state::CrawlState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{BrokenLinkRecord, ListQuery, UrlPage, UrlRecord};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

const RECORD_COLUMNS: &str = "id, url, status, title, html_version, h1_count, h2_count, \
     h3_count, h4_count, h5_count, h6_count, internal_links, external_links, broken_links, \
     login_form_found, created_at, updated_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        tracing::debug!("Opened database at {}", path.display());
        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn ensure_exists(&self, id: i64) -> StorageResult<()> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT id FROM urls WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;

        found.map(|_| ()).ok_or(StorageError::UrlNotFound(id))
    }
}

/// Maps a `urls` row selected with RECORD_COLUMNS
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<UrlRecord> {
    Ok(UrlRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        status: CrawlState::from_db_string(&row.get::<_, String>(2)?),
        title: row.get(3)?,
        html_version: row.get(4)?,
        h1_count: row.get(5)?,
        h2_count: row.get(6)?,
        h3_count: row.get(7)?,
        h4_count: row.get(8)?,
        h5_count: row.get(9)?,
        h6_count: row.get(10)?,
        internal_links: row.get(11)?,
        external_links: row.get(12)?,
        broken_links: row.get(13)?,
        login_form_found: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
        broken_link_details: Vec::new(),
    })
}

fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl Storage for SqliteStorage {
    // ===== URL Management =====

    fn insert_url(&mut self, url: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT INTO urls (url, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![url, CrawlState::Pending.to_db_string(), now],
        );

        match inserted {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => Err(StorageError::ConstraintViolation(
                format!("URL already stored: {}", url),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn get_url(&self, id: i64) -> StorageResult<UrlRecord> {
        let mut record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM urls WHERE id = ?1", RECORD_COLUMNS),
                params![id],
                record_from_row,
            )
            .optional()?
            .ok_or(StorageError::UrlNotFound(id))?;

        record.broken_link_details = self.broken_links_for(id)?;
        Ok(record)
    }

    fn get_url_by_address(&self, url: &str) -> StorageResult<Option<UrlRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM urls WHERE url = ?1", RECORD_COLUMNS),
                params![url],
                record_from_row,
            )
            .optional()?;

        match record {
            Some(mut record) => {
                record.broken_link_details = self.broken_links_for(record.id)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn list_urls(&self, query: &ListQuery) -> StorageResult<UrlPage> {
        let total_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM urls", [], |row| row.get(0))?;

        // Column and direction come from closed enums, never from raw input
        let sql = format!(
            "SELECT {} FROM urls ORDER BY {} {}, id {} LIMIT ?1 OFFSET ?2",
            RECORD_COLUMNS,
            query.sort_by.column(),
            query.order.keyword(),
            query.order.keyword()
        );

        let offset = i64::try_from(query.offset())
            .map_err(|_| StorageError::InvalidQuery(format!("page {} is too large", query.page)))?;

        let mut stmt = self.conn.prepare(&sql)?;
        let urls = stmt
            .query_map(params![i64::from(query.page_size), offset], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UrlPage {
            page: query.page,
            page_size: query.page_size,
            total_count: total_count.max(0) as u64,
            urls,
        })
    }

    fn delete_url(&mut self, id: i64) -> StorageResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM urls WHERE id = ?1", params![id])?;

        if deleted == 0 {
            return Err(StorageError::UrlNotFound(id));
        }
        Ok(())
    }

    // ===== Crawl Results =====

    fn update_status(&mut self, id: i64, state: &CrawlState) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE urls SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![state.to_db_string(), now, id],
        )?;

        if updated == 0 {
            return Err(StorageError::UrlNotFound(id));
        }
        Ok(())
    }

    fn save_outcome(&mut self, id: i64, outcome: &CrawlOutcome) -> StorageResult<()> {
        self.ensure_exists(id)?;

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        match (&outcome.state, &outcome.metrics) {
            (CrawlState::Done, Some(metrics)) => {
                let broken_count = u32::try_from(outcome.broken_links.len()).map_err(|_| {
                    StorageError::Database("broken link count out of range".to_string())
                })?;

                tx.execute(
                    "UPDATE urls SET status = ?1, title = ?2, html_version = ?3,
                     h1_count = ?4, h2_count = ?5, h3_count = ?6,
                     h4_count = ?7, h5_count = ?8, h6_count = ?9,
                     internal_links = ?10, external_links = ?11, broken_links = ?12,
                     login_form_found = ?13, updated_at = ?14
                     WHERE id = ?15",
                    params![
                        outcome.state.to_db_string(),
                        metrics.title,
                        metrics.html_version,
                        metrics.h1_count,
                        metrics.h2_count,
                        metrics.h3_count,
                        metrics.h4_count,
                        metrics.h5_count,
                        metrics.h6_count,
                        metrics.internal_links,
                        metrics.external_links,
                        broken_count,
                        metrics.login_form_found,
                        now,
                        id
                    ],
                )?;

                tx.execute("DELETE FROM broken_links WHERE url_id = ?1", params![id])?;

                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO broken_links (url_id, link, status) VALUES (?1, ?2, ?3)",
                    )?;
                    for broken in &outcome.broken_links {
                        stmt.execute(params![id, broken.url, broken.status])?;
                    }
                }
            }
            (state, _) => {
                tx.execute(
                    "UPDATE urls SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![state.to_db_string(), now, id],
                )?;
            }
        }

        tx.commit()?;

        tracing::debug!(
            "Saved outcome for URL {}: {} ({} broken link(s))",
            id,
            outcome.state,
            outcome.broken_links.len()
        );
        Ok(())
    }

    fn broken_links_for(&self, id: i64) -> StorageResult<Vec<BrokenLinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT link, status FROM broken_links WHERE url_id = ?1 ORDER BY link, id",
        )?;

        let links = stmt
            .query_map(params![id], |row| {
                Ok(BrokenLinkRecord {
                    link: row.get(0)?,
                    status: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }
}
