use crate::UrlError;
use url::Url;

/// Normalizes a `<loc>` value or sitemap reference into an absolute URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty values
/// 2. Parse as an absolute URL, or resolve against `base` when relative
/// 3. Reject schemes other than http/https and URLs without a host
/// 4. Remove the fragment (everything after #)
///
/// Host case and the path are left to the `url` crate's canonical form;
/// query strings are preserved because sitemap generators page with them.
///
/// # Examples
///
/// ```
/// use sitemap_harvester::url::normalize_location;
///
/// let loc = normalize_location("  https://example.com/a#top ", None).unwrap();
/// assert_eq!(loc, "https://example.com/a");
/// ```
pub fn normalize_location(raw: &str, base: Option<&Url>) -> Result<String, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base
                .join(trimmed)
                .map_err(|e| UrlError::Parse(e.to_string()))?,
            None => return Err(UrlError::Parse(format!("relative URL '{}'", trimmed))),
        },
        Err(e) => return Err(UrlError::Parse(e.to_string())),
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url.to_string())
}

/// Joins a base URL and an absolute path (`/sitemap.xml`) without doubling slashes
///
/// The base may carry a path prefix (`https://example.com/shop/`), which is kept.
pub fn join_base(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
