//! HTML parsing infrastructure for assessor detail pages
//!
//! One extraction grammar only: flatten the page into label/detail nodes,
//! then walk them pairing each value with the label before it.

pub mod config;
pub mod detail_extractor;
pub mod error;

pub use config::DetailPageSelectors;
pub use detail_extractor::DetailExtractor;
pub use error::{ParsingError, ParsingResult};
