//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the harvester:
//! - Building HTTP clients with manual redirect handling
//! - A randomized browser user agent per request
//! - Explicit redirect following with a caller-chosen hop budget
//! - Error classification into network and HTTP failures
//!
//! No retrying happens here; the retry policy lives in the worker.

use crate::config::HarvesterConfig;
use rand::seq::SliceRandom;
use reqwest::{header, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Browser identities rotated across requests
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Picks a user agent at random
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// A fetch failure
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Timeout, DNS failure, refused connection or a broken body stream
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },
}

impl FetchError {
    /// Returns true for failures worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// The URL that failed
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::Http { url, .. } => url,
        }
    }
}

/// A successfully fetched response body
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// The URL originally requested
    pub requested_url: String,

    /// URL of the response after any followed redirects
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Content-Encoding header value, if the transport left it in place
    pub content_encoding: Option<String>,

    /// Raw body bytes
    pub body: Vec<u8>,
}

/// Builds an HTTP client for the harvester
///
/// Redirects are never followed automatically; [`Fetcher::fetch`] follows
/// them explicitly so callers control the hop budget. Transport-level gzip
/// and brotli decoding stay enabled.
pub fn build_http_client(config: &HarvesterConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// A single HTTP session
///
/// Cloning a fetcher shares its connection pool; build separate fetchers
/// for sessions that must not share connections.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with its own HTTP client
    pub fn new(config: &HarvesterConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Fetches a URL, following at most `max_redirects` redirect hops
    ///
    /// # Request Flow
    ///
    /// | Response | Result |
    /// |----------|--------|
    /// | 2xx | `Ok(FetchedBody)` |
    /// | 3xx with Location, hops left | request the target |
    /// | 3xx otherwise | `FetchError::Http` |
    /// | 4xx / 5xx | `FetchError::Http` |
    /// | timeout, DNS, refused, body error | `FetchError::Network` |
    pub async fn fetch(&self, url: &str, max_redirects: u8) -> Result<FetchedBody, FetchError> {
        let mut current = url.to_string();
        let mut hops = 0u8;

        loop {
            let response = self
                .client
                .get(&current)
                .header(header::USER_AGENT, random_user_agent())
                .send()
                .await
                .map_err(|e| classify_error(&current, &e))?;

            let status = response.status();

            if status.is_redirection() {
                let target = redirect_target(&current, response.headers());
                match target {
                    Some(next) if hops < max_redirects => {
                        tracing::debug!("Following redirect {} -> {}", current, next);
                        hops += 1;
                        current = next;
                        continue;
                    }
                    _ => {
                        return Err(FetchError::Http {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                }
            }

            if !status.is_success() {
                return Err(FetchError::Http {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let content_type = header_value(response.headers(), header::CONTENT_TYPE);
            let content_encoding = header_value(response.headers(), header::CONTENT_ENCODING);
            let final_url = response.url().to_string();

            let body = response
                .bytes()
                .await
                .map_err(|e| classify_error(&current, &e))?;

            return Ok(FetchedBody {
                requested_url: url.to_string(),
                final_url,
                status: status.as_u16(),
                content_type,
                content_encoding,
                body: body.to_vec(),
            });
        }
    }
}

/// Resolves the Location header of a redirect against the current URL
fn redirect_target(current: &str, headers: &header::HeaderMap) -> Option<String> {
    let location = headers.get(header::LOCATION)?.to_str().ok()?;
    let base = Url::parse(current).ok()?;
    base.join(location.trim()).ok().map(|u| u.to_string())
}

fn header_value(headers: &header::HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Maps a reqwest error to a fetch error
fn classify_error(url: &str, error: &reqwest::Error) -> FetchError {
    if let Some(status) = error.status() {
        return FetchError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        };
    }

    let message = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    };

    FetchError::Network {
        url: url.to_string(),
        message,
    }
}

/// Returns true if the status code denotes access denial
pub fn is_forbidden_status(status: u16) -> bool {
    status == StatusCode::FORBIDDEN.as_u16() || status == StatusCode::UNAUTHORIZED.as_u16()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&HarvesterConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_random_user_agent_from_pool() {
        for _ in 0..20 {
            let ua = random_user_agent();
            assert!(USER_AGENTS.contains(&ua));
        }
    }

    #[test]
    fn test_redirect_target_relative() {
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, HeaderValue::from_static("/new/robots.txt"));
        let target = redirect_target("https://example.com/robots.txt", &headers);
        assert_eq!(target.as_deref(), Some("https://example.com/new/robots.txt"));
    }

    #[test]
    fn test_redirect_target_absolute() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::LOCATION,
            HeaderValue::from_static("https://www.example.com/robots.txt"),
        );
        let target = redirect_target("http://example.com/robots.txt", &headers);
        assert_eq!(target.as_deref(), Some("https://www.example.com/robots.txt"));
    }

    #[test]
    fn test_redirect_target_missing() {
        let headers = HeaderMap::new();
        assert!(redirect_target("https://example.com/", &headers).is_none());
    }

    #[test]
    fn test_transient_classification() {
        let network = FetchError::Network {
            url: "https://x.test/a.xml".to_string(),
            message: "request timeout".to_string(),
        };
        let http = FetchError::Http {
            url: "https://x.test/a.xml".to_string(),
            status: 404,
        };
        assert!(network.is_transient());
        assert!(!http.is_transient());
        assert_eq!(http.url(), "https://x.test/a.xml");
    }

    #[test]
    fn test_forbidden_status() {
        assert!(is_forbidden_status(403));
        assert!(is_forbidden_status(401));
        assert!(!is_forbidden_status(404));
    }
}
