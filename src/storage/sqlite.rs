//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::model::{AnalysisRecord, BrokenLink, HeadingCounts, JobStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SELECT_COLUMNS: &str = "SELECT id, url, status, title, html_version, headings,
     internal_links, external_links, accessible_links, broken_links, has_login_form
     FROM analyses";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

/// A row as stored, before the JSON columns are decoded
struct RawRecord {
    id: String,
    url: String,
    status: String,
    title: String,
    html_version: String,
    headings: String,
    internal_links: u32,
    external_links: u32,
    accessible_links: u32,
    broken_links: String,
    has_login_form: bool,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            status: row.get(2)?,
            title: row.get(3)?,
            html_version: row.get(4)?,
            headings: row.get(5)?,
            internal_links: row.get(6)?,
            external_links: row.get(7)?,
            accessible_links: row.get(8)?,
            broken_links: row.get(9)?,
            has_login_form: row.get(10)?,
        })
    }

    fn decode(self) -> StorageResult<AnalysisRecord> {
        let headings: HeadingCounts = serde_json::from_str(&self.headings)?;
        let broken_links: Vec<BrokenLink> = serde_json::from_str(&self.broken_links)?;

        Ok(AnalysisRecord {
            id: self.id,
            url: self.url,
            status: JobStatus::from_db_string(&self.status).unwrap_or(JobStatus::Error),
            title: self.title,
            html_version: self.html_version,
            headings,
            internal_links: self.internal_links,
            external_links: self.external_links,
            accessible_links: self.accessible_links,
            broken_links,
            has_login_form: self.has_login_form,
        })
    }
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// The parent directory is created if it does not exist.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteStorage {
    fn save(&mut self, record: &AnalysisRecord) -> StorageResult<()> {
        let headings = serde_json::to_string(&record.headings)?;
        let broken_links = serde_json::to_string(&record.broken_links)?;

        // Upsert keeps the original rowid, so listing order stays stable
        self.conn.execute(
            "INSERT INTO analyses (
                id, url, status, title, html_version, headings,
                internal_links, external_links, accessible_links, broken_links, has_login_form
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                url = excluded.url,
                status = excluded.status,
                title = excluded.title,
                html_version = excluded.html_version,
                headings = excluded.headings,
                internal_links = excluded.internal_links,
                external_links = excluded.external_links,
                accessible_links = excluded.accessible_links,
                broken_links = excluded.broken_links,
                has_login_form = excluded.has_login_form",
            params![
                record.id,
                record.url,
                record.status.to_db_string(),
                record.title,
                record.html_version,
                headings,
                record.internal_links,
                record.external_links,
                record.accessible_links,
                broken_links,
                record.has_login_form,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> StorageResult<Option<AnalysisRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))?;

        let raw = stmt
            .query_row(params![id], RawRecord::from_row)
            .optional()?;

        raw.map(RawRecord::decode).transpose()
    }

    fn get_all(&self) -> StorageResult<Vec<AnalysisRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY rowid", SELECT_COLUMNS))?;

        let rows = stmt
            .query_map([], RawRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawRecord::decode).collect()
    }

    fn update(&mut self, id: &str, record: &AnalysisRecord) -> StorageResult<bool> {
        let headings = serde_json::to_string(&record.headings)?;
        let broken_links = serde_json::to_string(&record.broken_links)?;

        let changed = self.conn.execute(
            "UPDATE analyses SET
                url = ?1, status = ?2, title = ?3, html_version = ?4, headings = ?5,
                internal_links = ?6, external_links = ?7, accessible_links = ?8,
                broken_links = ?9, has_login_form = ?10
             WHERE id = ?11",
            params![
                record.url,
                record.status.to_db_string(),
                record.title,
                record.html_version,
                headings,
                record.internal_links,
                record.external_links,
                record.accessible_links,
                broken_links,
                record.has_login_form,
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete(&mut self, id: &str) -> StorageResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM analyses WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
