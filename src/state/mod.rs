//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `SitemapNode` / `NodeKind`: a sitemap URL being resolved and its classification
//! - `SitemapRecord`: one harvested URL entry
//! - `RunState`: visited sitemaps and accumulated records for one run

mod node_state;
mod record;
mod run_state;

// Re-export main types
pub use node_state::{NodeKind, SitemapNode};
pub use record::SitemapRecord;
pub use run_state::{dedupe, RunState};
