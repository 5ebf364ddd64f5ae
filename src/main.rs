//! Sitemap Harvester main entry point
//!
//! This is the command-line interface for the sitemap harvester.

use anyhow::{bail, Context};
use clap::Parser;
use sitemap_harvester::config::{load_config_with_hash, validate, Config, SiteConfig};
use sitemap_harvester::discovery::{candidate_urls, robots_url};
use sitemap_harvester::harvest;
use sitemap_harvester::output::{load_statistics, print_statistics, print_summaries};
use sitemap_harvester::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Sitemap Harvester: a batch sitemap resolver
///
/// Discovers the sitemaps a site exposes through robots.txt and well-known
/// paths, resolves sitemap indexes down to leaf sitemaps and stores a
/// deduplicated set of URL entries in SQLite.
#[derive(Parser, Debug)]
#[command(name = "sitemap-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A batch sitemap harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Harvest only this base URL instead of the configured sites (repeatable)
    #[arg(long = "site", value_name = "URL")]
    sites: Vec<String>,

    /// Validate config and list candidate seed sitemaps without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if !cli.sites.is_empty() {
        config.sites = cli.sites.iter().map(SiteConfig::new).collect();
        validate(&config).context("Invalid --site value")?;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(&config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_harvester=info,warn"),
            1 => EnvFilter::new("sitemap_harvester=debug,info"),
            2 => EnvFilter::new("sitemap_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be tried
fn handle_dry_run(config: &Config) {
    println!("=== Sitemap Harvester Dry Run ===\n");

    println!("Harvester Configuration:");
    println!("  Max depth: {}", config.harvester.max_depth);
    println!("  Workers: {}", config.harvester.workers);
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.harvester.request_timeout_secs, config.harvester.connect_timeout_secs
    );
    println!(
        "  Retries: {} (backoff {}ms)",
        config.harvester.max_retries, config.harvester.retry_backoff_ms
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Batch size: {}", config.output.batch_size);
    println!("  Skip existing: {}", config.output.skip_existing);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        let candidates = candidate_urls(site, &[]);
        println!("  - {}", site.base_url);
        println!("    robots.txt: {}", robots_url(&site.base_url));
        for candidate in &candidates {
            println!("    * {}", candidate);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    if config.sites.is_empty() {
        bail!("No sites configured; add a [[site]] table or pass --site");
    }

    tracing::info!(
        "Harvesting {} site(s) with {} worker(s), max depth {}",
        config.sites.len(),
        config.harvester.workers,
        config.harvester.max_depth
    );

    let summaries = harvest(config, config_hash).await?;
    print_summaries(&summaries);

    if summaries.iter().all(|s| s.is_failed()) {
        bail!("Every site failed to harvest");
    }

    tracing::info!("Harvest completed");
    Ok(())
}
