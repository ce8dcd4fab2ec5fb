//! Assessor Sync - keeps a parcel registry in step with county assessor detail pages
//!
//! For each registry PIN the pipeline fetches the assessor detail page,
//! pairs labels with values, normalizes the values and upserts one row into
//! `property_details`.

pub mod application;
pub mod domain;
pub mod infrastructure;
