//! Per-node resolution pipeline
//!
//! A `NodeWorker` takes one unresolved sitemap node through
//! fetch → decode → validate → classify and reports the outcome. Failures
//! are captured in the outcome instead of being returned, so one bad
//! sitemap never affects its siblings.

use crate::config::HarvesterConfig;
use crate::harvester::decode::{decode, DecodeError};
use crate::harvester::expander::{classify_document, Expansion};
use crate::harvester::fetcher::{is_forbidden_status, FetchError, FetchedBody, Fetcher};
use crate::harvester::parser::ParseError;
use crate::harvester::validate::{validate, ValidationError};
use crate::state::{NodeKind, SitemapNode, SitemapRecord};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a sitemap node was skipped
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("undecodable content at {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: DecodeError,
    },

    #[error("invalid content at {url}: {source}")]
    Validation {
        url: String,
        #[source]
        source: ValidationError,
    },

    #[error("unparseable sitemap at {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },
}

impl NodeError {
    /// Returns true if the server denied access, by status or by body
    pub fn is_forbidden(&self) -> bool {
        match self {
            Self::Http { status, .. } => is_forbidden_status(*status),
            Self::Validation { source, .. } => matches!(source, ValidationError::Forbidden),
            _ => false,
        }
    }
}

impl From<FetchError> for NodeError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Network { url, message } => Self::Network { url, message },
            FetchError::Http { url, status } => Self::Http { url, status },
        }
    }
}

/// Result of resolving one node
#[derive(Debug)]
pub struct NodeOutcome {
    /// The node with its final classification
    pub node: SitemapNode,

    /// Sitemaps the node points to
    pub children: Vec<SitemapNode>,

    /// Page records of the node, in document order
    pub records: Vec<SitemapRecord>,

    /// Entries dropped during extraction
    pub invalid_entries: u64,

    /// `<sitemap>` entries that were neither followed nor recorded
    pub unfollowed_sitemaps: u64,

    /// Set when the node was skipped
    pub error: Option<NodeError>,
}

impl NodeOutcome {
    /// Outcome of a successfully classified node
    pub fn resolved(node: SitemapNode, expansion: Expansion) -> Self {
        Self {
            node: node.resolved(expansion.kind),
            children: expansion.children,
            records: expansion.extraction.records,
            invalid_entries: expansion.extraction.invalid,
            unfollowed_sitemaps: expansion.unfollowed,
            error: None,
        }
    }

    /// Outcome of a node that had to be skipped
    pub fn failed(node: SitemapNode, error: NodeError) -> Self {
        Self {
            node: node.resolved(NodeKind::Invalid),
            children: Vec::new(),
            records: Vec::new(),
            invalid_entries: 0,
            unfollowed_sitemaps: 0,
            error: Some(error),
        }
    }
}

/// Pipeline settings shared by every worker of a run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_redirects: u8,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub strip_non_printable: bool,
}

impl From<&HarvesterConfig> for PipelineSettings {
    fn from(config: &HarvesterConfig) -> Self {
        Self {
            max_redirects: config.max_redirects,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            strip_non_printable: config.strip_non_printable,
        }
    }
}

/// Delay before retry number `attempt` (1-based): `backoff × attempt`
pub fn retry_delay(backoff: Duration, attempt: u32) -> Duration {
    backoff.checked_mul(attempt).unwrap_or(Duration::MAX)
}

/// A validated document and the URL it was served from
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Final URL after redirects
    pub url: String,

    /// Decoded, validated XML
    pub text: String,
}

/// Resolves sitemap nodes with its own HTTP session
#[derive(Debug, Clone)]
pub struct NodeWorker {
    fetcher: Fetcher,
    settings: Arc<PipelineSettings>,
}

impl NodeWorker {
    /// Creates a worker around a fetcher
    pub fn new(fetcher: Fetcher, settings: Arc<PipelineSettings>) -> Self {
        Self { fetcher, settings }
    }

    /// Resolves one node; never fails, errors are part of the outcome
    pub async fn process(&self, node: SitemapNode) -> NodeOutcome {
        match self.resolve(&node).await {
            Ok(expansion) => NodeOutcome::resolved(node, expansion),
            Err(error) => NodeOutcome::failed(node, error),
        }
    }

    async fn resolve(&self, node: &SitemapNode) -> Result<Expansion, NodeError> {
        let document = self.load_document(&node.url).await?;
        classify_document(node, &document.url, &document.text).map_err(|source| {
            NodeError::Parse {
                url: node.url.clone(),
                source,
            }
        })
    }

    /// Fetches, decodes and validates the document at `url`
    ///
    /// # Returns
    ///
    /// * `Ok(LoadedDocument)` - Validated sitemap XML and the URL it was served from
    /// * `Err(NodeError)` - The node must be skipped
    pub async fn load_document(&self, url: &str) -> Result<LoadedDocument, NodeError> {
        let fetched = self.fetch_with_retry(url).await?;

        tracing::debug!(
            "Fetched {} ({} bytes, status {}, content-type {:?})",
            fetched.final_url,
            fetched.body.len(),
            fetched.status,
            fetched.content_type
        );

        let text = decode(
            &fetched.body,
            &fetched.final_url,
            fetched.content_encoding.as_deref(),
            self.settings.strip_non_printable,
        )
        .map_err(|source| NodeError::Decode {
            url: url.to_string(),
            source,
        })?;

        validate(&text).map_err(|source| NodeError::Validation {
            url: url.to_string(),
            source,
        })?;

        Ok(LoadedDocument {
            url: fetched.final_url,
            text,
        })
    }

    /// Fetches with linear backoff on network errors
    async fn fetch_with_retry(&self, url: &str) -> Result<FetchedBody, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            match self.fetcher.fetch(url, self.settings.max_redirects).await {
                Err(e) if e.is_transient() && attempt < self.settings.max_retries => {
                    attempt += 1;
                    let delay = retry_delay(self.settings.retry_backoff, attempt);
                    tracing::debug!(
                        "Retrying {} in {:?} (attempt {} of {}): {}",
                        url,
                        delay,
                        attempt,
                        self.settings.max_retries,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}
