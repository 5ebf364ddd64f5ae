//! Storage module for persisting harvest results
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Batched, transactional insertion of sitemap records
//! - Run tracking (status, records written, failed batches)
//! - Statistics queries for `--stats`

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{RecordStore, StorageError, StorageResult};

use crate::HarvestError;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub base_url: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub records_written: u64,
    pub batches_failed: u64,
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// How a batch treats locations that are already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Plain insert; a stored location fails the whole batch
    Plain,

    /// Existence-checked insert; stored locations are skipped
    SkipExisting,
}

impl InsertMode {
    pub fn from_skip_existing(skip_existing: bool) -> Self {
        if skip_existing {
            Self::SkipExisting
        } else {
            Self::Plain
        }
    }
}
