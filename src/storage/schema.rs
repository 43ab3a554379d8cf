//! Database schema definitions
//!
//! Heading counts and broken links are stored as JSON text columns.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS analyses (
    id TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    status TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    html_version TEXT NOT NULL DEFAULT '',
    headings TEXT NOT NULL DEFAULT '{}',
    internal_links INTEGER NOT NULL DEFAULT 0,
    external_links INTEGER NOT NULL DEFAULT 0,
    accessible_links INTEGER NOT NULL DEFAULT 0,
    broken_links TEXT NOT NULL DEFAULT '[]',
    has_login_form INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_analyses_status ON analyses(status);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
