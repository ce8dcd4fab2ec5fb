//! Application layer module
//!
//! Wires the pipeline stages together: PIN supply, page fetch, extraction,
//! normalization and the retrying upsert writer.

pub mod page_fetcher;
pub mod pin_supplier;
pub mod sync_service;
pub mod upsert_writer;

pub use page_fetcher::{AssessorPageFetcher, FetchOutcome, PageFetcher};
pub use pin_supplier::PinSupplier;
pub use sync_service::{BatchSummary, PinOutcome, PinResult, SyncService};
pub use upsert_writer::{UpsertWriter, WriteError};
