use crate::config::types::{Config, HarvesterConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound accepted for `max-depth`
const MAX_DEPTH_LIMIT: u32 = 64;

/// Upper bound accepted for `workers`
const MAX_WORKERS: usize = 128;

/// Upper bound accepted for `retry-backoff-ms` (one minute)
const MAX_RETRY_BACKOFF_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvester_config(&config.harvester)?;
    validate_output_config(&config.output)?;
    for site in &config.sites {
        validate_site(site)?;
    }
    Ok(())
}

/// Validates pipeline configuration
fn validate_harvester_config(config: &HarvesterConfig) -> Result<(), ConfigError> {
    if config.max_depth < 1 || config.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth must be between 1 and {}, got {}",
            MAX_DEPTH_LIMIT, config.max_depth
        )));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_ms must be <= {}, got {}",
            MAX_RETRY_BACKOFF_MS, config.retry_backoff_ms
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch_size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates a site entry
fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url(&site.base_url, "base_url")?;

    if let Some(paths) = &site.fallback_paths {
        for path in paths {
            if !path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "Fallback path '{}' for {} must start with '/'",
                    path, site.base_url
                )));
            }
        }
    }

    for sitemap in &site.extra_sitemaps {
        validate_http_url(sitemap, "extra_sitemaps entry")?;
    }

    Ok(())
}

/// Checks that a string is an absolute http(s) URL with a host
fn validate_http_url(value: &str, field: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(())
}
