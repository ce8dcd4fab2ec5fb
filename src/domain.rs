//! Domain module - parcel identifiers, detail records and normalization
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod label_value_page;
pub mod normalization;
pub mod parcel;
pub mod property_detail;

pub use label_value_page::{
    ExtractedDetails, ExtractionAnomalies, LabelValuePage, NodeKind, PageNode,
};
pub use normalization::{NormalizationError, normalize_record};
pub use parcel::{PaddedPin, RegistryPin};
pub use property_detail::{DetailField, FieldKind, FieldValue, PropertyDetailRecord};
