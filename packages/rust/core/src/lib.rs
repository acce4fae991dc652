//! Core pipeline orchestration for clubfeed.
//!
//! This crate ties together the taxonomy loader, the spreadsheet row source
//! and the row mapper into the ingestion run, and owns the published
//! artifact file.

pub mod pipeline;
pub mod store;

pub use pipeline::{IngestSummary, ProgressReporter, RowFailure, SilentProgress, ingest, run_ingest};
pub use store::{artifact_digest, read_collection, write_collection};
