//! Sitemap document parser
//!
//! This module turns validated sitemap XML into structured data:
//! - Extracting every `<loc>` value of `<url>` and `<sitemap>` entries
//! - Partitioning locations into further sitemaps and content pages
//! - Extracting page entries into normalized `SitemapRecord`s
//!
//! Documents are deserialized as a whole with `quick_xml::de`; element
//! order inside an entry does not matter and unknown elements (image,
//! video, hreflang extensions) are ignored.

use crate::state::SitemapRecord;
use crate::url::{is_sitemap_url, normalize_location};
use crate::UrlError;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// A document that could not be deserialized
#[derive(Debug, Error)]
#[error("failed to parse sitemap document: {0}")]
pub struct ParseError(#[from] quick_xml::DeError);

/// A single `<url>` entry that had to be dropped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("entry has no <loc>")]
    MissingLocation,

    #[error("invalid location {location:?}: {source}")]
    InvalidLocation {
        location: String,
        #[source]
        source: UrlError,
    },

    #[error("invalid priority {0:?}")]
    InvalidPriority(String),
}

/// Root of a `<urlset>` or `<sitemapindex>` document
///
/// The root element name is not checked here; the validator already did.
/// A document may carry both kinds of entries.
#[derive(Debug, Default, Deserialize)]
pub struct SitemapDocument {
    #[serde(rename = "url", default)]
    pub urls: Vec<EntryElement>,

    #[serde(rename = "sitemap", default)]
    pub sitemaps: Vec<EntryElement>,
}

/// One `<url>` or `<sitemap>` entry
///
/// Fields are lists so that repeated child elements do not fail the whole
/// document; the first value wins.
#[derive(Debug, Default, Deserialize)]
pub struct EntryElement {
    #[serde(default)]
    loc: Vec<String>,

    #[serde(default)]
    priority: Vec<String>,

    #[serde(default)]
    changefreq: Vec<String>,
}

impl EntryElement {
    /// Trimmed `<loc>` value, if present and non-empty
    pub fn location(&self) -> Option<&str> {
        first_non_empty(&self.loc)
    }

    /// Trimmed `<priority>` value, if present and non-empty
    pub fn priority(&self) -> Option<&str> {
        first_non_empty(&self.priority)
    }

    /// Trimmed `<changefreq>` value, if present and non-empty
    pub fn change_frequency(&self) -> Option<&str> {
        first_non_empty(&self.changefreq)
    }
}

fn first_non_empty(values: &[String]) -> Option<&str> {
    values
        .first()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

impl SitemapDocument {
    /// All `<loc>` values in the document, sitemap entries first
    pub fn locations(&self) -> Vec<&str> {
        self.sitemaps
            .iter()
            .chain(self.urls.iter())
            .filter_map(EntryElement::location)
            .collect()
    }
}

/// Deserializes a validated sitemap document
pub fn parse_document(text: &str) -> Result<SitemapDocument, ParseError> {
    Ok(quick_xml::de::from_str(text)?)
}

/// Splits locations into sitemap-document URLs and page URLs
///
/// # Returns
///
/// `(sitemaps, pages)`, each keeping input order
pub fn partition_locations<I, S>(locations: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    locations
        .into_iter()
        .map(Into::into)
        .partition(|loc| is_sitemap_url(loc))
}

/// Records extracted from one document
#[derive(Debug, Default)]
pub struct Extraction {
    /// Valid records in document order
    pub records: Vec<SitemapRecord>,

    /// Entries dropped for missing or malformed fields
    pub invalid: u64,
}

/// Extracts the page records of a leaf document
///
/// # Arguments
///
/// * `text` - Validated sitemap XML
/// * `origin_url` - URL of the document, stored as each record's source
///
/// # Returns
///
/// * `Ok(Extraction)` - Records plus the count of dropped entries
/// * `Err(ParseError)` - The document could not be deserialized at all
pub fn extract_records(text: &str, origin_url: &str) -> Result<Extraction, ParseError> {
    let document = parse_document(text)?;
    let base = Url::parse(origin_url).ok();
    Ok(records_from(&document, base.as_ref(), origin_url))
}

/// Extracts page records from an already parsed document
///
/// `<url>` entries whose location is sitemap-shaped are skipped; they are
/// followed as nested sitemaps instead. Relative locations resolve against
/// `base`; `origin_url` is stored as each record's source.
pub fn records_from(
    document: &SitemapDocument,
    base: Option<&Url>,
    origin_url: &str,
) -> Extraction {
    let mut extraction = Extraction::default();

    for entry in &document.urls {
        if entry.location().map(is_sitemap_url).unwrap_or(false) {
            continue;
        }

        match parse_entry(entry, base, origin_url) {
            Ok(record) => extraction.records.push(record),
            Err(e) => {
                tracing::debug!("Dropping entry in {}: {}", origin_url, e);
                extraction.invalid += 1;
            }
        }
    }

    extraction
}

/// Builds a record from a `<url>` entry
fn parse_entry(
    entry: &EntryElement,
    base: Option<&Url>,
    origin_url: &str,
) -> Result<SitemapRecord, ExtractionError> {
    let raw = entry.location().ok_or(ExtractionError::MissingLocation)?;
    let location =
        normalize_location(raw, base).map_err(|source| ExtractionError::InvalidLocation {
            location: raw.to_string(),
            source,
        })?;

    let mut record = SitemapRecord::new(location, origin_url);

    if let Some(raw_priority) = entry.priority() {
        record = record.with_priority(parse_priority(raw_priority)?);
    }

    if let Some(freq) = entry.change_frequency() {
        record = record.with_change_frequency(freq.to_ascii_lowercase());
    }

    Ok(record)
}

/// Parses a priority value; it must be a number in `[0.0, 1.0]`
pub fn parse_priority(raw: &str) -> Result<f64, ExtractionError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && (0.0..=1.0).contains(&value) => Ok(value),
        _ => Err(ExtractionError::InvalidPriority(raw.to_string())),
    }
}
