//! PIN supply for a sync run

use anyhow::Result;
use tracing::{info, warn};

use crate::domain::{PaddedPin, RegistryPin};
use crate::infrastructure::RegistryRepository;

/// Ordered PIN list for one run. Order is kept and nothing is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinSupplier {
    pins: Vec<RegistryPin>,
}

impl PinSupplier {
    pub fn new(pins: Vec<RegistryPin>) -> Self {
        Self { pins }
    }

    /// Every PIN in the registry, in `PropertyID` order
    pub async fn from_registry(registry: &RegistryRepository) -> Result<Self> {
        let pins = registry.list_pins().await?;
        info!("📋 Loaded {} PINs from registry", pins.len());
        Ok(Self::new(pins))
    }

    /// PINs given on the command line; blank arguments are dropped
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pins = args
            .into_iter()
            .map(|arg| arg.as_ref().trim().to_string())
            .filter(|arg| !arg.is_empty())
            .map(RegistryPin::from)
            .collect();
        Self::new(pins)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Pair each registry PIN with its URL form
    pub fn padded(&self) -> Vec<(RegistryPin, PaddedPin)> {
        self.pins
            .iter()
            .map(|pin| {
                if pin.is_oversized() {
                    warn!("PIN '{}' is longer than 14 characters; using it unpadded", pin);
                }
                (pin.clone(), pin.pad())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_args_trims_and_drops_blanks() {
        let supplier = PinSupplier::from_args([" 1234567890 ", "", "   ", "17000000000000"]);
        assert_eq!(supplier.len(), 2);

        let padded: Vec<String> = supplier
            .padded()
            .into_iter()
            .map(|(_, padded)| padded.to_string())
            .collect();
        assert_eq!(padded, vec!["12345678900000", "17000000000000"]);
    }

    #[test]
    fn test_duplicates_are_kept_in_order() {
        let supplier = PinSupplier::from_args(["2", "1", "2"]);
        let registry: Vec<String> = supplier
            .padded()
            .into_iter()
            .map(|(pin, _)| pin.to_string())
            .collect();
        assert_eq!(registry, vec!["2", "1", "2"]);
    }

    #[test]
    fn test_oversized_pin_passes_through() {
        let supplier = PinSupplier::from_args(["123456789012345"]);
        let (_, padded) = &supplier.padded()[0];
        assert_eq!(padded.as_str(), "123456789012345");
    }
}
