//! Land plot record

use crate::geocode::GeocodeResult;
use serde::Serialize;

/// Plot size, address and (once looked up) its geocode
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotRecord {
    pub size_square_meters: u32,
    pub address_text: String,
    pub geocode: Option<GeocodeResult>,
}

impl PlotRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_size(&mut self, size_square_meters: u32) {
        self.size_square_meters = size_square_meters;
    }

    /// Replace the address; a changed address drops the stale geocode.
    ///
    /// Returns true if the address actually changed.
    pub fn set_address(&mut self, address: impl Into<String>) -> bool {
        let address = address.into();
        if address == self.address_text {
            return false;
        }
        self.address_text = address;
        self.geocode = None;
        true
    }

    /// Address with surrounding whitespace removed, None if blank
    pub fn address(&self) -> Option<&str> {
        let trimmed = self.address_text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn needs_geocode(&self) -> bool {
        self.geocode.is_none() && self.address().is_some()
    }

    pub fn set_geocode(&mut self, result: GeocodeResult) {
        self.geocode = Some(result);
    }
}
