//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::state::SitemapRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{InsertMode, RunRecord, RunStatus};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, base_url, started_at, finished_at, config_hash, status, records_written, batches_failed";

const INSERT_SQL: &str = "INSERT INTO sitemap_entries (sitemap_url, loc, priority, changefreq, run_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const INSERT_OR_IGNORE_SQL: &str = "INSERT OR IGNORE INTO sitemap_entries (sitemap_url, loc, priority, changefreq, run_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

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
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        base_url: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Running),
        records_written: row.get::<_, i64>(6)? as u64,
        batches_failed: row.get::<_, i64>(7)? as u64,
    })
}

/// Separates unique-constraint failures from other SQLite errors
fn classify_insert_error(error: rusqlite::Error) -> StorageError {
    match &error {
        rusqlite::Error::SqliteFailure(e, message) if e.code == ErrorCode::ConstraintViolation => {
            StorageError::ConstraintViolation(
                message.clone().unwrap_or_else(|| e.to_string()),
            )
        }
        _ => StorageError::Sqlite(error),
    }
}

impl RecordStore for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, base_url: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (base_url, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![base_url, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        records_written: u64,
        batches_failed: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, records_written = ?3, batches_failed = ?4 WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                records_written as i64,
                batches_failed as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let query = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&query, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn list_runs(&self) -> StorageResult<Vec<RunRecord>> {
        let query = format!("SELECT {} FROM runs ORDER BY id DESC", RUN_COLUMNS);
        let mut stmt = self.conn.prepare(&query)?;
        let runs = stmt
            .query_map([], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    // ===== Records =====

    fn insert_batch(
        &mut self,
        run_id: i64,
        records: &[SitemapRecord],
        mode: InsertMode,
    ) -> StorageResult<usize> {
        let sql = match mode {
            InsertMode::Plain => INSERT_SQL,
            InsertMode::SkipExisting => INSERT_OR_IGNORE_SQL,
        };
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(sql)?;
            for record in records {
                inserted += stmt
                    .execute(params![
                        record.source_sitemap,
                        record.location,
                        record.priority,
                        record.change_frequency,
                        run_id,
                        now
                    ])
                    .map_err(classify_insert_error)?;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }

    fn get_record(&self, location: &str) -> StorageResult<Option<SitemapRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT loc, priority, changefreq, sitemap_url FROM sitemap_entries WHERE loc = ?1",
                params![location],
                |row| {
                    Ok(SitemapRecord {
                        location: row.get(0)?,
                        priority: row.get(1)?,
                        change_frequency: row.get(2)?,
                        source_sitemap: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    // ===== Statistics =====

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sitemap_entries", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_sitemap(&self) -> StorageResult<Vec<(String, u64)>> {
        let query = "
            SELECT sitemap_url, COUNT(*) as count
            FROM sitemap_entries
            GROUP BY sitemap_url
            ORDER BY count DESC, sitemap_url
        ";

        let mut stmt = self.conn.prepare(query)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }

        Ok(counts)
    }
}
