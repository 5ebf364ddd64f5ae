//! URL handling module
//!
//! This module provides location normalization and the sitemap-document
//! shape check used to partition `<loc>` entries.

mod normalize;

pub use normalize::{join_base, normalize_location};

use url::Url;

/// File extensions that mark a location as a further sitemap document
const SITEMAP_EXTENSIONS: &[&str] = &[".xml", ".xml.gz", ".gz"];

/// Returns true if a location looks like a sitemap document rather than a page
///
/// The check is made on the URL path, so query strings used for paging
/// (`sitemap.xml?page=2`) do not hide the extension. Values that do not
/// parse as URLs are checked as plain strings.
///
/// # Examples
///
/// ```
/// use sitemap_harvester::url::is_sitemap_url;
///
/// assert!(is_sitemap_url("https://example.com/sitemap-1.xml"));
/// assert!(is_sitemap_url("https://example.com/sitemap-2.xml.gz"));
/// assert!(!is_sitemap_url("https://example.com/products/42"));
/// ```
pub fn is_sitemap_url(location: &str) -> bool {
    let trimmed = location.trim();
    let path = match Url::parse(trimmed) {
        Ok(url) => url.path().to_ascii_lowercase(),
        Err(_) => trimmed.to_ascii_lowercase(),
    };

    SITEMAP_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Returns true if a location points to a gzip-compressed document by name
pub fn is_gzip_url(location: &str) -> bool {
    let trimmed = location.trim();
    let path = match Url::parse(trimmed) {
        Ok(url) => url.path().to_ascii_lowercase(),
        Err(_) => trimmed.to_ascii_lowercase(),
    };

    path.ends_with(".gz")
}
