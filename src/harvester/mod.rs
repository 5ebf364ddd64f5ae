//! Sitemap harvesting pipeline
//!
//! # Components
//!
//! - `fetcher`: HTTP GET with a randomized identity and explicit redirects
//! - `decode`: gzip detection and UTF-8 decoding
//! - `validate`: well-formedness and disguised-error checks
//! - `parser`: `<loc>` extraction and record extraction
//! - `expander`: index/leaf classification and the breadth-first worklist
//! - `worker`: the per-node fetch → decode → validate → classify pipeline
//! - `pool`: bounded worker pool
//! - `coordinator`: per-site runs and batched persistence

mod coordinator;
pub mod decode;
pub mod expander;
pub mod fetcher;
pub mod parser;
mod pool;
pub mod validate;
mod worker;

pub use coordinator::{harvest, persist_records, Harvester, PersistOutcome};
pub use expander::{classify_document, Expander, Expansion};
pub use fetcher::{build_http_client, FetchError, FetchedBody, Fetcher};
pub use parser::{extract_records, partition_locations, Extraction};
pub use pool::WorkerPool;
pub use validate::{validate, ValidationError};
pub use worker::{LoadedDocument, NodeError, NodeOutcome, NodeWorker, PipelineSettings};
