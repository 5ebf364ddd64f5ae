//! Seed sitemap discovery
//!
//! This module resolves the list of sitemap URLs a run starts from:
//! - `Sitemap:` entries of `{base_url}/robots.txt`
//! - Extra sitemaps configured for the site
//! - Well-known fallback paths joined onto the base URL
//!
//! The sources are appended in that order and duplicates removed, keeping
//! the first occurrence. Fallbacks are always tried; a missing or broken
//! robots.txt only means the robots source contributes nothing.

mod robots;

pub use robots::extract_sitemap_urls;

use crate::config::SiteConfig;
use crate::harvester::Fetcher;
use crate::url::{join_base, normalize_location};
use std::collections::HashSet;

/// Redirect hops followed when fetching robots.txt
pub const ROBOTS_MAX_REDIRECTS: u8 = 1;

/// Returns the robots.txt URL for a base URL
pub fn robots_url(base_url: &str) -> String {
    join_base(base_url, "/robots.txt")
}

/// Builds the ordered seed list from robots.txt results and site settings
///
/// # Arguments
///
/// * `site` - The site being harvested
/// * `robots_sitemaps` - Sitemap URLs found in robots.txt
///
/// # Returns
///
/// Unique, normalized seed URLs: robots entries, then extra sitemaps, then
/// fallback paths
pub fn candidate_urls(site: &SiteConfig, robots_sitemaps: &[String]) -> Vec<String> {
    let fallbacks = site
        .fallback_paths()
        .into_iter()
        .map(|path| join_base(&site.base_url, &path));

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for raw in robots_sitemaps
        .iter()
        .cloned()
        .chain(site.extra_sitemaps.iter().cloned())
        .chain(fallbacks)
    {
        match normalize_location(&raw, None) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    candidates.push(url);
                }
            }
            Err(e) => {
                tracing::debug!("Ignoring seed candidate {:?}: {}", raw, e);
            }
        }
    }

    candidates
}

/// Fetches robots.txt and extracts its sitemap references
///
/// A redirect is followed for exactly one hop. Any failure is logged and
/// yields an empty list.
pub async fn fetch_robots_sitemaps(fetcher: &Fetcher, base_url: &str) -> Vec<String> {
    let url = robots_url(base_url);

    match fetcher.fetch(&url, ROBOTS_MAX_REDIRECTS).await {
        Ok(fetched) => {
            let content = String::from_utf8_lossy(&fetched.body);
            let sitemaps = extract_sitemap_urls(&content, &fetched.final_url);
            tracing::info!(
                "robots.txt at {} lists {} sitemap(s)",
                fetched.final_url,
                sitemaps.len()
            );
            sitemaps
        }
        Err(e) => {
            tracing::warn!("robots.txt unavailable, using fallback paths only: {}", e);
            Vec::new()
        }
    }
}

/// Resolves the seed sitemap URLs for a site
pub async fn discover_sitemaps(fetcher: &Fetcher, site: &SiteConfig) -> Vec<String> {
    let robots_sitemaps = fetch_robots_sitemaps(fetcher, &site.base_url).await;
    let seeds = candidate_urls(site, &robots_sitemaps);
    tracing::info!(
        "Discovered {} seed sitemap(s) for {} ({} from robots.txt)",
        seeds.len(),
        site.base_url,
        robots_sitemaps.len()
    );
    seeds
}
