//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::state::SitemapRecord;
use crate::storage::{InsertMode, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// The harvester only relies on "accepts a batch of records keyed by
/// location"; schema and connection handling belong to the implementation.
pub trait RecordStore {
    // ===== Run Management =====

    /// Creates a new harvest run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `base_url` - The site being harvested
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, base_url: &str, config_hash: &str) -> StorageResult<i64>;

    /// Records the final status and counters of a run
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        records_written: u64,
        batches_failed: u64,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets all runs, most recent first
    fn list_runs(&self) -> StorageResult<Vec<RunRecord>>;

    // ===== Records =====

    /// Inserts one batch of records in a single transaction
    ///
    /// # Arguments
    ///
    /// * `run_id` - The run the records belong to
    /// * `records` - The batch, already deduplicated within the run
    /// * `mode` - Whether stored locations are skipped or rejected
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted. On error nothing from the
    /// batch is kept.
    fn insert_batch(
        &mut self,
        run_id: i64,
        records: &[SitemapRecord],
        mode: InsertMode,
    ) -> StorageResult<usize>;

    /// Gets the stored record for a location
    fn get_record(&self, location: &str) -> StorageResult<Option<SitemapRecord>>;

    // ===== Statistics =====

    /// Gets total record count
    fn count_records(&self) -> StorageResult<u64>;

    /// Gets record counts per source sitemap, largest first
    fn count_by_sitemap(&self) -> StorageResult<Vec<(String, u64)>>;
}
