//! Output module for harvest summaries and reports
//!
//! This module handles:
//! - The end-of-run summary printed after each invocation
//! - Statistics over everything persisted so far (`--stats`)

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
pub use summary::{print_summaries, RunSummary};
