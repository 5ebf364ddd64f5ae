//! End-of-run summary
//!
//! A `RunSummary` is produced for every harvested site, whether the run
//! completed or failed, and printed by the binary once all sites are done.

use crate::state::{NodeKind, RunState};
use crate::storage::RunStatus;
use std::collections::HashMap;

/// Summary statistics for one harvest run
#[derive(Debug, Clone)]
pub struct RunSummary {
    // Run metadata
    pub run_id: Option<i64>,
    pub base_url: String,
    pub status: RunStatus,
    pub error: Option<String>,
    pub duration_seconds: f64,

    // Resolution
    pub seeds: usize,
    pub nodes_by_kind: HashMap<NodeKind, u64>,
    pub depth_exceeded: u64,
    pub unfollowed_sitemaps: u64,

    // Records
    pub records_extracted: u64,
    pub duplicates_dropped: u64,
    pub invalid_entries: u64,

    // Persistence
    pub records_written: u64,
    pub batches_attempted: u64,
    pub batches_failed: u64,
}

impl RunSummary {
    /// Creates an empty summary for a site
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            run_id: None,
            base_url: base_url.into(),
            status: RunStatus::Running,
            error: None,
            duration_seconds: 0.0,
            seeds: 0,
            nodes_by_kind: HashMap::new(),
            depth_exceeded: 0,
            unfollowed_sitemaps: 0,
            records_extracted: 0,
            duplicates_dropped: 0,
            invalid_entries: 0,
            records_written: 0,
            batches_attempted: 0,
            batches_failed: 0,
        }
    }

    /// Copies the resolution counters of a finished run
    pub fn absorb_state(&mut self, state: &RunState) {
        self.seeds = state.seeds.len();
        self.nodes_by_kind = state.node_counts();
        self.depth_exceeded = state.depth_exceeded();
        self.unfollowed_sitemaps = state.unfollowed_sitemaps();
        self.records_extracted = state.records().len() as u64;
        self.duplicates_dropped = state.duplicates_dropped();
        self.invalid_entries = state.invalid_entries();
    }

    /// Number of nodes with the given classification
    pub fn nodes(&self, kind: NodeKind) -> u64 {
        self.nodes_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Returns true if the run failed as a whole
    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }
}

/// Prints run summaries to stdout
pub fn print_summaries(summaries: &[RunSummary]) {
    println!("=== Harvest Summary ===\n");

    for summary in summaries {
        match summary.run_id {
            Some(id) => println!("{} (run {})", summary.base_url, id),
            None => println!("{}", summary.base_url),
        }
        println!("  Status: {}", summary.status.to_db_string());
        if let Some(error) = &summary.error {
            println!("  Error: {}", error);
        }
        println!("  Duration: {:.1}s", summary.duration_seconds);
        println!(
            "  Sitemaps: {} seeds, {} index, {} leaf, {} skipped",
            summary.seeds,
            summary.nodes(NodeKind::Index),
            summary.nodes(NodeKind::Leaf),
            summary.nodes(NodeKind::Invalid)
        );
        if summary.depth_exceeded > 0 {
            println!("  Branches over depth limit: {}", summary.depth_exceeded);
        }
        if summary.unfollowed_sitemaps > 0 {
            println!(
                "  <sitemap> entries not followed: {}",
                summary.unfollowed_sitemaps
            );
        }
        println!(
            "  Records: {} unique, {} duplicates dropped, {} invalid entries",
            summary.records_extracted, summary.duplicates_dropped, summary.invalid_entries
        );
        println!(
            "  Persisted: {} records written, {} of {} batches failed",
            summary.records_written, summary.batches_failed, summary.batches_attempted
        );
        println!();
    }

    let written: u64 = summaries.iter().map(|s| s.records_written).sum();
    let failed = summaries.iter().filter(|s| s.is_failed()).count();
    println!(
        "Total: {} records written across {} site(s), {} failed",
        written,
        summaries.len(),
        failed
    );
}
