//! Sitemap Harvester: a batch sitemap resolver
//!
//! This crate discovers the sitemaps a website exposes (robots.txt plus a set of
//! well-known paths), recursively resolves sitemap indexes down to leaf sitemaps,
//! extracts their URL entries and persists a deduplicated record set.

pub mod config;
pub mod discovery;
pub mod harvester;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for run-level failures
///
/// Per-node problems (network failures, bad status codes, undecodable or
/// invalid documents) never surface here; they are reported through
/// [`harvester::NodeError`] and logged as skipped nodes.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No sitemap could be resolved for {base_url}")]
    NoSitemaps { base_url: String },

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Empty location")]
    Empty,

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use harvester::{harvest, Harvester};
pub use state::{dedupe, NodeKind, SitemapNode, SitemapRecord};
pub use url::{is_sitemap_url, normalize_location};
