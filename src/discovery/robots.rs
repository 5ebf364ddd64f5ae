//! Sitemap references in robots.txt
//!
//! Only `Sitemap:` lines are used; allow/disallow rules are ignored.

use robotstxt::{parse_robotstxt, RobotsParseHandler};
use url::Url;

/// Collects `Sitemap:` values while robots.txt is parsed
#[derive(Debug, Default)]
struct SitemapCollector {
    sitemaps: Vec<String>,
}

impl RobotsParseHandler for SitemapCollector {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, _user_agent: &str) {}

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {}

    fn handle_disallow(&mut self, _line_num: u32, _value: &str) {}

    fn handle_sitemap(&mut self, _line_num: u32, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.sitemaps.push(value.to_string());
        }
    }

    fn handle_unknown_action(&mut self, _line_num: u32, _action: &str, _value: &str) {}
}

/// Extracts sitemap URLs from robots.txt content
///
/// Directive names are matched case-insensitively. Relative values are
/// resolved against `robots_url`; values that still do not form an
/// http(s) URL are dropped.
///
/// # Arguments
///
/// * `content` - The raw robots.txt body
/// * `robots_url` - The URL robots.txt was served from
///
/// # Returns
///
/// Sitemap URLs in file order
pub fn extract_sitemap_urls(content: &str, robots_url: &str) -> Vec<String> {
    let mut collector = SitemapCollector::default();
    parse_robotstxt(content, &mut collector);

    let base = Url::parse(robots_url).ok();
    collector
        .sitemaps
        .into_iter()
        .filter_map(|raw| match crate::url::normalize_location(&raw, base.as_ref()) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!("Ignoring robots.txt sitemap {:?}: {}", raw, e);
                None
            }
        })
        .collect()
}
