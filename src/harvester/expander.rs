//! Sitemap classification and recursive expansion
//!
//! Expansion is a breadth-first worklist rather than recursion: every level
//! of unresolved nodes is resolved (in parallel, by the worker pool), then
//! merged here in frontier order to produce the next level. The visited set
//! and the depth bound are applied at enqueue time, so a URL is fetched at
//! most once per run and no branch runs deeper than `max_depth`.

use crate::harvester::parser::{
    parse_document, partition_locations, records_from, EntryElement, Extraction, ParseError,
};
use crate::harvester::worker::NodeOutcome;
use crate::state::{NodeKind, RunState, SitemapNode};
use crate::url::{is_sitemap_url, normalize_location};
use std::collections::HashSet;
use url::Url;

/// Result of classifying one validated document
#[derive(Debug, Default)]
pub struct Expansion {
    /// `Index` if the document names further sitemaps, `Leaf` otherwise
    pub kind: NodeKind,

    /// Sitemap documents to resolve next, one level deeper
    pub children: Vec<SitemapNode>,

    /// Page records found in the document itself
    pub extraction: Extraction,

    /// `<sitemap>` entries without a sitemap extension, neither followed nor recorded
    pub unfollowed: u64,
}

/// Classifies a validated document as index or leaf
///
/// # Classification
///
/// - Every `<loc>` is partitioned by shape (`.xml`, `.xml.gz`, `.gz`).
/// - Sitemap-shaped locations become children at `depth + 1`, resolved
///   against the document URL and deduplicated in document order.
/// - A document with no sitemap-shaped location is a leaf.
/// - Page entries are extracted either way, so a mixed document
///   contributes both children and records.
///
/// Relative locations resolve against `document_url`, the URL the document
/// was actually served from after redirects.
pub fn classify_document(
    node: &SitemapNode,
    document_url: &str,
    text: &str,
) -> Result<Expansion, ParseError> {
    let document = parse_document(text)?;
    let base = Url::parse(document_url).ok();

    let (sitemaps, _pages) = partition_locations(document.locations());

    let mut seen = HashSet::new();
    let mut children = Vec::new();
    for location in sitemaps {
        match normalize_location(&location, base.as_ref()) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    children.push(node.child(url));
                }
            }
            Err(e) => {
                tracing::debug!("Ignoring sitemap entry {:?} in {}: {}", location, node.url, e);
            }
        }
    }

    let unfollowed = document
        .sitemaps
        .iter()
        .filter_map(EntryElement::location)
        .filter(|loc| !is_sitemap_url(loc))
        .count() as u64;

    if unfollowed > 0 {
        tracing::warn!(
            "{} lists {} <sitemap> entries without a sitemap extension; not followed",
            node.url,
            unfollowed
        );
    }

    let kind = if children.is_empty() {
        NodeKind::Leaf
    } else {
        NodeKind::Index
    };

    Ok(Expansion {
        kind,
        children,
        extraction: records_from(&document, base.as_ref(), &node.url),
        unfollowed,
    })
}

/// Frontier bookkeeping for one run
#[derive(Debug, Clone, Copy)]
pub struct Expander {
    max_depth: u32,
}

impl Expander {
    /// Creates an expander that discards nodes deeper than `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    /// The configured depth bound
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Builds the first frontier from the run's seed URLs
    ///
    /// Repeated seeds are queued once.
    pub fn seed(&self, state: &mut RunState) -> Vec<SitemapNode> {
        let seeds = state.seeds.clone();
        let mut frontier = Vec::with_capacity(seeds.len());
        for url in seeds {
            if state.mark_visited(&url) {
                frontier.push(SitemapNode::seed(url));
            }
        }
        frontier
    }

    /// Merges one resolved level into the run and returns the next frontier
    ///
    /// Outcomes must be given in frontier order; records are absorbed and
    /// children enqueued in that order, which makes first-seen-wins
    /// deterministic.
    pub fn merge_level(&self, state: &mut RunState, outcomes: Vec<NodeOutcome>) -> Vec<SitemapNode> {
        let mut next = Vec::new();

        for outcome in outcomes {
            match &outcome.error {
                Some(error) if error.is_forbidden() => {
                    tracing::warn!(
                        "Skipping forbidden sitemap {} (depth {}): {}",
                        outcome.node.url,
                        outcome.node.depth,
                        error
                    );
                }
                Some(error) => {
                    tracing::warn!(
                        "Skipping sitemap {} (depth {}): {}",
                        outcome.node.url,
                        outcome.node.depth,
                        error
                    );
                }
                None => {
                    tracing::debug!(
                        "Resolved {} as {} ({} children, {} records, {} invalid entries)",
                        outcome.node.url,
                        outcome.node.kind,
                        outcome.children.len(),
                        outcome.records.len(),
                        outcome.invalid_entries
                    );
                }
            }

            if outcome.invalid_entries > 0 {
                state.record_invalid_entries(outcome.invalid_entries);
            }
            if outcome.unfollowed_sitemaps > 0 {
                state.record_unfollowed_sitemaps(outcome.unfollowed_sitemaps);
            }
            state.absorb(outcome.records);

            for child in outcome.children {
                self.enqueue(state, child, &mut next);
            }

            state.record_node(outcome.node);
        }

        next
    }

    /// Queues a child unless it was already visited or is too deep
    fn enqueue(&self, state: &mut RunState, child: SitemapNode, frontier: &mut Vec<SitemapNode>) {
        if state.is_visited(&child.url) {
            tracing::debug!("Already visited {}, not following again", child.url);
            return;
        }

        if child.depth > self.max_depth {
            tracing::warn!(
                "Depth limit {} exceeded, discarding branch {}",
                self.max_depth,
                child.url
            );
            state.record_depth_exceeded();
            return;
        }

        state.mark_visited(&child.url);
        frontier.push(child);
    }
}
