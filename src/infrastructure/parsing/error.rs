//! Parsing error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Selector '{selector}' must name a class (e.g. div.detail-row--label)")]
    MissingClass { selector: String },
}

impl ParsingError {
    /// Create an invalid selector error
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for parsing operations
pub type ParsingResult<T> = Result<T, ParsingError>;
