//! CCR Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Streams a Combined/Constrained Coding Regions (CCR) release into
//! documents keyed by genomic coordinate, ready for bulk loading into a
//! document store.
//!
//! Each line of a release file goes through the same stages: split into 13
//! columns, coerce to typed fields, assemble a record in the configured
//! schema, sweep empty values, and wrap it as
//! `{"_id": "chr<chrom>:g.<start>_<end>", "<source_key>": {...}}`.
//! Malformed lines are logged and skipped; the run continues.
//!
//! # Example
//!
//! ```no_run
//! use ccr_ingest::{CcrConfig, CcrLoader};
//!
//! fn main() -> anyhow::Result<()> {
//!     let loader = CcrLoader::new(CcrConfig::default())?;
//!     for doc in loader.load_data("./data/ccr")? {
//!         let doc = doc?;
//!         println!("{}", serde_json::to_string(&doc)?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod loader;
pub mod models;
pub mod parser;
pub mod progress;
pub mod sweep;

pub use config::{CcrConfig, SchemaVariant, SourceFile};
pub use loader::{CcrDocuments, CcrLoader, FileScan};
pub use models::{CcrDocument, FileSummary, ScoreEntry, VarFlag, VariantRecord};
pub use parser::{CcrParser, LineError};
