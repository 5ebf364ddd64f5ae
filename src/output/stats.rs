//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{RecordStore, RunRecord};
use crate::HarvestError;

/// Number of sitemaps listed in the per-sitemap breakdown
const TOP_SITEMAPS: usize = 20;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored records
    pub total_records: u64,

    /// Record counts per source sitemap, largest first
    pub records_by_sitemap: Vec<(String, u64)>,

    /// Run history, most recent first
    pub runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn RecordStore) -> Result<HarvestStatistics, HarvestError> {
    Ok(HarvestStatistics {
        total_records: storage.count_records()?,
        records_by_sitemap: storage.count_by_sitemap()?,
        runs: storage.list_runs()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  Source sitemaps: {}", stats.records_by_sitemap.len());
    println!("  Runs: {}", stats.runs.len());
    println!();

    if !stats.records_by_sitemap.is_empty() {
        println!("Records by Sitemap:");
        for (sitemap, count) in stats.records_by_sitemap.iter().take(TOP_SITEMAPS) {
            let percentage = if stats.total_records > 0 {
                (*count as f64 / stats.total_records as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", sitemap, count, percentage);
        }
        if stats.records_by_sitemap.len() > TOP_SITEMAPS {
            println!(
                "  ... and {} more",
                stats.records_by_sitemap.len() - TOP_SITEMAPS
            );
        }
        println!();
    }

    if !stats.runs.is_empty() {
        println!("Run History:");
        for run in &stats.runs {
            println!(
                "  #{} {} [{}] started {}, {} written, {} failed batches",
                run.id,
                run.base_url,
                run.status.to_db_string(),
                run.started_at,
                run.records_written,
                run.batches_failed
            );
        }
    }
}
