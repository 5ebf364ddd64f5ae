//! Database schema definitions
//!
//! This module contains the SQL schema for the harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track harvest runs, one per site per invocation
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    base_url TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    records_written INTEGER NOT NULL DEFAULT 0,
    batches_failed INTEGER NOT NULL DEFAULT 0
);

-- Harvested sitemap entries, unique by location across runs
CREATE TABLE IF NOT EXISTS sitemap_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sitemap_url TEXT NOT NULL,
    loc TEXT NOT NULL UNIQUE,
    priority REAL,
    changefreq TEXT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_sitemap ON sitemap_entries(sitemap_url);
CREATE INDEX IF NOT EXISTS idx_entries_run ON sitemap_entries(run_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
