use serde::Deserialize;

/// Fallback sitemap paths tried for every site in addition to robots.txt entries
pub const DEFAULT_FALLBACK_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap-index.xml",
    "/sitemap.php",
    "/sitemap.txt",
    "/sitemap.xml.gz",
    "/sitemap/",
    "/sitemap/sitemap.xml",
    "/sitemapindex.xml",
    "/sitemap/index.xml",
    "/sitemap1.xml",
];

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harvester: HarvesterConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteConfig>,
}

/// Pipeline behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HarvesterConfig {
    /// Maximum sitemap-index nesting followed from a seed
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Number of concurrent workers resolving sitemap documents
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Whole-request timeout for a single fetch (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Redirect hops followed when fetching a sitemap document
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: u8,

    /// Extra attempts after a network failure (0 disables retrying)
    #[serde(rename = "max-retries", default)]
    pub max_retries: u32,

    /// Base delay between retry attempts (milliseconds), multiplied by the attempt number
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Remove control characters from decoded documents before validation
    #[serde(rename = "strip-non-printable", default = "default_true")]
    pub strip_non_printable: bool,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            workers: default_workers(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_redirects: default_max_redirects(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff(),
            strip_non_printable: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Number of records handed to storage per insert
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Skip locations that are already stored instead of failing the batch
    #[serde(rename = "skip-existing", default = "default_true")]
    pub skip_existing: bool,
}

/// A site to harvest
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the site (scheme and host, optionally a path prefix)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Replaces the default fallback path list for this site
    #[serde(rename = "fallback-paths", default)]
    pub fallback_paths: Option<Vec<String>>,

    /// Sitemap URLs seeded in addition to the discovered ones
    #[serde(rename = "extra-sitemaps", default)]
    pub extra_sitemaps: Vec<String>,
}

impl SiteConfig {
    /// Creates a site entry with default discovery settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            fallback_paths: None,
            extra_sitemaps: Vec::new(),
        }
    }

    /// Returns the fallback paths in effect for this site
    pub fn fallback_paths(&self) -> Vec<String> {
        match &self.fallback_paths {
            Some(paths) => paths.clone(),
            None => DEFAULT_FALLBACK_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

fn default_max_depth() -> u32 {
    20
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, 16)
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_redirects() -> u8 {
    3
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_batch_size() -> usize {
    10_000
}

fn default_true() -> bool {
    true
}
