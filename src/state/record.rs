//! Harvested sitemap records

/// One URL entry harvested from a leaf sitemap
///
/// Records are immutable once extracted; `location` is always non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapRecord {
    /// The page URL (`<loc>`), unique within a run
    pub location: String,

    /// `<priority>` value, absent when the entry carries none
    pub priority: Option<f64>,

    /// `<changefreq>` value as written by the site
    pub change_frequency: Option<String>,

    /// URL of the leaf sitemap the entry came from
    pub source_sitemap: String,
}

impl SitemapRecord {
    /// Creates a record without optional metadata
    pub fn new(location: impl Into<String>, source_sitemap: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            priority: None,
            change_frequency: None,
            source_sitemap: source_sitemap.into(),
        }
    }

    /// Sets the priority
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the change frequency
    pub fn with_change_frequency(mut self, change_frequency: impl Into<String>) -> Self {
        self.change_frequency = Some(change_frequency.into());
        self
    }
}
