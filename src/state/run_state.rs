//! Per-run state: visited sitemap set and accumulated records
//!
//! A `RunState` is owned by the orchestrator for the duration of one run and
//! is only ever mutated from that single task. Workers hand their local
//! results back and the orchestrator merges them here, in discovery order.

use crate::state::{NodeKind, SitemapNode, SitemapRecord};
use std::collections::{HashMap, HashSet};

/// Removes records whose location was already seen, keeping the first occurrence
///
/// Order of the surviving records follows the input order.
pub fn dedupe(records: Vec<SitemapRecord>) -> Vec<SitemapRecord> {
    retain_first_seen(&mut HashSet::with_capacity(records.len()), records).0
}

/// Keeps the records whose location is not in `seen` yet and adds them to it
///
/// Returns the kept records and the number dropped.
fn retain_first_seen(
    seen: &mut HashSet<String>,
    records: Vec<SitemapRecord>,
) -> (Vec<SitemapRecord>, u64) {
    let total = records.len();
    let kept: Vec<SitemapRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.location.clone()))
        .collect();
    let dropped = (total - kept.len()) as u64;
    (kept, dropped)
}

/// State of a single harvest run over one site
#[derive(Debug, Default)]
pub struct RunState {
    /// Base URL of the site being harvested
    pub base_url: String,

    /// Seed sitemap URLs the run started from
    pub seeds: Vec<String>,

    visited: HashSet<String>,
    nodes: Vec<SitemapNode>,
    seen_locations: HashSet<String>,
    records: Vec<SitemapRecord>,
    duplicates_dropped: u64,
    invalid_entries: u64,
    depth_exceeded: u64,
    unfollowed_sitemaps: u64,
}

impl RunState {
    /// Creates the state for a new run
    pub fn new(base_url: impl Into<String>, seeds: Vec<String>) -> Self {
        Self {
            base_url: base_url.into(),
            seeds,
            ..Self::default()
        }
    }

    /// Marks a sitemap URL as visited
    ///
    /// Returns false if the URL had already been visited in this run.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Returns true if the sitemap URL has been visited
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Number of distinct sitemap URLs visited
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Records the final classification of a node
    pub fn record_node(&mut self, node: SitemapNode) {
        self.nodes.push(node);
    }

    /// Counts a branch discarded by the depth bound
    pub fn record_depth_exceeded(&mut self) {
        self.depth_exceeded += 1;
    }

    /// Counts `<url>` entries dropped during extraction
    pub fn record_invalid_entries(&mut self, count: u64) {
        self.invalid_entries += count;
    }

    /// Counts `<sitemap>` entries that were neither followed nor recorded
    pub fn record_unfollowed_sitemaps(&mut self, count: u64) {
        self.unfollowed_sitemaps += count;
    }

    /// Merges a leaf's records, keeping the first record seen for each location
    ///
    /// Returns the number of records that were new to this run.
    pub fn absorb(&mut self, records: Vec<SitemapRecord>) -> usize {
        let (kept, dropped) = retain_first_seen(&mut self.seen_locations, records);
        let added = kept.len();
        self.records.extend(kept);
        self.duplicates_dropped += dropped;
        added
    }

    /// Records accumulated so far, in merge order
    pub fn records(&self) -> &[SitemapRecord] {
        &self.records
    }

    /// Consumes the state and returns its records
    pub fn into_records(self) -> Vec<SitemapRecord> {
        self.records
    }

    /// Resolved nodes in the order they were merged
    pub fn nodes(&self) -> &[SitemapNode] {
        &self.nodes
    }

    /// Number of resolved nodes per classification
    pub fn node_counts(&self) -> HashMap<NodeKind, u64> {
        let mut counts = HashMap::new();
        for node in &self.nodes {
            *counts.entry(node.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Records dropped because their location was already harvested
    pub fn duplicates_dropped(&self) -> u64 {
        self.duplicates_dropped
    }

    /// Entries dropped for missing or malformed fields
    pub fn invalid_entries(&self) -> u64 {
        self.invalid_entries
    }

    /// Branches discarded by the depth bound
    pub fn depth_exceeded(&self) -> u64 {
        self.depth_exceeded
    }

    /// `<sitemap>` entries skipped because they do not name a sitemap document
    pub fn unfollowed_sitemaps(&self) -> u64 {
        self.unfollowed_sitemaps
    }
}
