//! Harvest coordinator - run orchestration
//!
//! This module drives one run per site:
//! - Discovering seed sitemaps (robots.txt plus fallbacks)
//! - Resolving the sitemap tree level by level on the worker pool
//! - Merging worker results into the run state in discovery order
//! - Handing the deduplicated records to storage in fixed-size batches
//! - Recording the run and producing its summary

use crate::config::{Config, HarvesterConfig, OutputConfig, SiteConfig};
use crate::discovery::discover_sitemaps;
use crate::harvester::expander::Expander;
use crate::harvester::fetcher::Fetcher;
use crate::harvester::pool::WorkerPool;
use crate::harvester::worker::{NodeWorker, PipelineSettings};
use crate::output::RunSummary;
use crate::state::{NodeKind, RunState, SitemapRecord};
use crate::storage::{InsertMode, RecordStore, RunStatus, SqliteStorage};
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Counters of one persistence pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub records_written: u64,
    pub batches_attempted: u64,
    pub batches_failed: u64,
}

/// Main harvest structure
///
/// Owns the worker pool (one HTTP session per worker) and a separate
/// session for discovery requests.
pub struct Harvester {
    pool: WorkerPool<NodeWorker>,
    discovery: Fetcher,
    expander: Expander,
}

impl Harvester {
    /// Creates a harvester with `config.workers` workers
    ///
    /// # Arguments
    ///
    /// * `config` - The pipeline configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - An HTTP client could not be built
    pub fn new(config: &HarvesterConfig) -> Result<Self, HarvestError> {
        let settings = Arc::new(PipelineSettings::from(config));

        let workers = (0..config.workers.max(1))
            .map(|_| Fetcher::new(config).map(|f| NodeWorker::new(f, Arc::clone(&settings))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pool: WorkerPool::new(workers),
            discovery: Fetcher::new(config)?,
            expander: Expander::new(config.max_depth),
        })
    }

    /// Number of concurrent workers
    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    /// Resolves the seed sitemaps of a site
    pub async fn discover(&self, site: &SiteConfig) -> Vec<String> {
        discover_sitemaps(&self.discovery, site).await
    }

    /// Resolves every sitemap reachable from the seeds
    ///
    /// # Algorithm
    ///
    /// 1. Seeds form the first frontier (depth 0)
    /// 2. The frontier is resolved in parallel on the pool
    /// 3. Outcomes are merged in frontier order; unvisited children within
    ///    the depth bound form the next frontier
    /// 4. Repeat until the frontier is empty
    ///
    /// # Returns
    ///
    /// * `Ok(RunState)` - At least one seed resolved to a sitemap document
    /// * `Err(HarvestError::NoSitemaps)` - No seed could be resolved
    /// * `Err(HarvestError::Worker)` - A worker task panicked
    pub async fn run(&self, base_url: &str, seeds: Vec<String>) -> Result<RunState, HarvestError> {
        let mut state = RunState::new(base_url, seeds);
        let mut frontier = self.expander.seed(&mut state);
        let mut depth = 0u32;

        while !frontier.is_empty() {
            tracing::info!(
                "Resolving {} sitemap(s) at depth {} with {} worker(s)",
                frontier.len(),
                depth,
                self.pool.size()
            );

            let outcomes = self
                .pool
                .map(frontier, |worker: NodeWorker, node| async move {
                    worker.process(node).await
                })
                .await?;

            frontier = self.expander.merge_level(&mut state, outcomes);
            depth += 1;
        }

        let seeds_resolved = state
            .nodes()
            .iter()
            .filter(|n| n.depth == 0 && n.kind != NodeKind::Invalid)
            .count();

        if seeds_resolved == 0 {
            return Err(HarvestError::NoSitemaps {
                base_url: base_url.to_string(),
            });
        }

        tracing::info!(
            "Resolved {} sitemap(s) for {}: {} unique records, {} duplicates dropped",
            state.nodes().len(),
            base_url,
            state.records().len(),
            state.duplicates_dropped()
        );

        Ok(state)
    }

    /// Resolves the seeds and returns the deduplicated records
    pub async fn collect(
        &self,
        base_url: &str,
        seeds: Vec<String>,
    ) -> Result<Vec<SitemapRecord>, HarvestError> {
        Ok(self.run(base_url, seeds).await?.into_records())
    }

    /// Harvests one site into the store
    ///
    /// Never fails: run-level errors are recorded in the returned summary
    /// and in the run's status.
    pub async fn harvest_site(
        &self,
        store: &mut dyn RecordStore,
        site: &SiteConfig,
        config_hash: &str,
        output: &OutputConfig,
    ) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::new(&site.base_url);

        let run_id = match store.create_run(&site.base_url, config_hash) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Could not record run for {}: {}", site.base_url, e);
                summary.status = RunStatus::Failed;
                summary.error = Some(e.to_string());
                return summary;
            }
        };
        summary.run_id = Some(run_id);
        tracing::info!("Starting run {} for {}", run_id, site.base_url);

        let seeds = self.discover(site).await;

        match self.run(&site.base_url, seeds).await {
            Ok(state) => {
                summary.absorb_state(&state);

                let persisted = persist_records(
                    store,
                    run_id,
                    state.records(),
                    output.batch_size,
                    InsertMode::from_skip_existing(output.skip_existing),
                );
                summary.records_written = persisted.records_written;
                summary.batches_attempted = persisted.batches_attempted;
                summary.batches_failed = persisted.batches_failed;
                summary.status = RunStatus::Completed;
            }
            Err(e) => {
                tracing::error!("Run {} for {} failed: {}", run_id, site.base_url, e);
                summary.status = RunStatus::Failed;
                summary.error = Some(e.to_string());
            }
        }

        summary.duration_seconds = started.elapsed().as_secs_f64();

        if let Err(e) = store.finish_run(
            run_id,
            summary.status,
            summary.records_written,
            summary.batches_failed,
        ) {
            tracing::error!("Could not finish run {}: {}", run_id, e);
        }

        tracing::info!(
            "Run {} {}: {} records written, {} of {} batches failed",
            run_id,
            summary.status.to_db_string(),
            summary.records_written,
            summary.batches_failed,
            summary.batches_attempted
        );

        summary
    }
}

/// Hands records to storage in batches of `batch_size`
///
/// Each batch is inserted in its own transaction. A failed batch is logged
/// and counted; later batches are still attempted.
///
/// # Arguments
///
/// * `store` - The record store
/// * `run_id` - The run the records belong to
/// * `records` - Deduplicated records in merge order
/// * `batch_size` - Records per batch (at least 1)
/// * `mode` - Plain or existence-checked insert
pub fn persist_records(
    store: &mut dyn RecordStore,
    run_id: i64,
    records: &[SitemapRecord],
    batch_size: usize,
    mode: InsertMode,
) -> PersistOutcome {
    let mut outcome = PersistOutcome::default();

    for (index, batch) in records.chunks(batch_size.max(1)).enumerate() {
        outcome.batches_attempted += 1;

        let without_priority = batch.iter().filter(|r| r.priority.is_none()).count();
        if without_priority > 0 {
            tracing::debug!(
                "Batch {}: {} record(s) without priority stored as NULL",
                index + 1,
                without_priority
            );
        }

        match store.insert_batch(run_id, batch, mode) {
            Ok(inserted) => {
                outcome.records_written += inserted as u64;
                tracing::info!(
                    "Batch {}: saved {} of {} record(s)",
                    index + 1,
                    inserted,
                    batch.len()
                );
            }
            Err(e) => {
                outcome.batches_failed += 1;
                tracing::error!(
                    "Batch {} of {} record(s) failed: {}",
                    index + 1,
                    batch.len(),
                    e
                );
            }
        }
    }

    outcome
}

/// Harvests every configured site, one run each, sequentially
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `config_hash` - Hash of the configuration file, stored with each run
///
/// # Returns
///
/// * `Ok(Vec<RunSummary>)` - One summary per site, failed runs included
/// * `Err(HarvestError)` - Storage or HTTP clients could not be set up
pub async fn harvest(config: &Config, config_hash: &str) -> Result<Vec<RunSummary>, HarvestError> {
    let mut store = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let harvester = Harvester::new(&config.harvester)?;

    let mut summaries = Vec::with_capacity(config.sites.len());
    for site in &config.sites {
        let summary = harvester
            .harvest_site(&mut store, site, config_hash, &config.output)
            .await;
        summaries.push(summary);
    }

    Ok(summaries)
}
