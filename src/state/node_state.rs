/// Sitemap node definitions for tracking resolution progress
///
/// A node is one sitemap URL being resolved during a run.
use std::fmt;

/// Classification of a sitemap node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Discovered but not yet fetched and classified
    #[default]
    Unresolved,

    /// Document whose entries point to further sitemap documents
    Index,

    /// Document whose entries are content pages
    Leaf,

    /// Fetch, decode or validation failed; the node is discarded
    Invalid,
}

impl NodeKind {
    /// Stable lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Index => "index",
            Self::Leaf => "leaf",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sitemap URL queued for resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapNode {
    /// The sitemap URL
    pub url: String,

    /// Nesting depth below the seed (seeds are depth 0)
    pub depth: u32,

    /// Current classification
    pub kind: NodeKind,
}

impl SitemapNode {
    /// Creates a seed node at depth 0
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
            kind: NodeKind::Unresolved,
        }
    }

    /// Creates an unresolved child one level below this node
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: self.depth + 1,
            kind: NodeKind::Unresolved,
        }
    }

    /// Returns a copy of this node with its classification set
    pub fn resolved(&self, kind: NodeKind) -> Self {
        Self {
            url: self.url.clone(),
            depth: self.depth,
            kind,
        }
    }
}
