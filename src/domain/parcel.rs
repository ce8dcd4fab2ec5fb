//! Parcel identifiers (PIN)
//!
//! The registry stores the short form; the assessor URL scheme wants a
//! 14-character form. The two are separate types so a padded PIN can never be
//! padded a second time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the PIN segment in assessor detail-page URLs
pub const PADDED_PIN_LEN: usize = 14;

/// Character used for right-padding short PINs
pub const PIN_PAD_CHAR: char = '0';

/// Short-form PIN as stored in the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryPin(String);

/// 14-character PIN as expected by the assessor site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaddedPin(String);

impl RegistryPin {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Right-pad to 14 characters with zeros.
    ///
    /// Inputs already 14 characters long come back unchanged. Longer inputs
    /// also pass through untouched; callers log them, they are not an error.
    pub fn pad(&self) -> PaddedPin {
        let len = self.0.chars().count();
        if len >= PADDED_PIN_LEN {
            return PaddedPin(self.0.clone());
        }

        let mut padded = String::with_capacity(PADDED_PIN_LEN);
        padded.push_str(&self.0);
        padded.extend(std::iter::repeat_n(PIN_PAD_CHAR, PADDED_PIN_LEN - len));
        PaddedPin(padded)
    }

    /// True when the value is longer than the padded width
    pub fn is_oversized(&self) -> bool {
        self.0.chars().count() > PADDED_PIN_LEN
    }
}

impl PaddedPin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RegistryPin {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RegistryPin {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RegistryPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PaddedPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
