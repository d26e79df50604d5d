//! Address geocoding
//!
//! - `GeocodeProvider`: the external lookup seam
//! - `nominatim`: OpenStreetMap Nominatim implementation (rate limited)
//! - `cache`: TTL cache in front of any provider
//!
//! Failures never propagate past the cache: timeouts and network errors become
//! a `GeocodeResult` with `found = false` and an error message, an unknown
//! address becomes `found = false` without one.

pub mod cache;
pub mod nominatim;

pub use cache::{CacheStats, GeocodeCache};
pub use nominatim::NominatimClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider errors
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Geocoding request timed out after {0} s")]
    Timeout(u64),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A successful provider match
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// Outcome of a lookup, as stored in the cache and on the plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub resolved_address: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// How a result should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeStatus {
    Resolved,
    /// Provider answered but knows no such address
    NotFound,
    /// Provider could not be reached or failed
    Unavailable,
}

impl GeocodeResult {
    pub fn resolved(hit: GeocodeHit) -> Self {
        Self {
            latitude: hit.latitude,
            longitude: hit.longitude,
            resolved_address: hit.display_name,
            found: true,
            error_message: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            resolved_address: String::new(),
            found: false,
            error_message: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::not_found()
        }
    }

    pub fn status(&self) -> GeocodeStatus {
        match (self.found, &self.error_message) {
            (true, _) => GeocodeStatus::Resolved,
            (false, None) => GeocodeStatus::NotFound,
            (false, Some(_)) => GeocodeStatus::Unavailable,
        }
    }
}

impl From<Result<Option<GeocodeHit>, GeocodeError>> for GeocodeResult {
    fn from(outcome: Result<Option<GeocodeHit>, GeocodeError>) -> Self {
        match outcome {
            Ok(Some(hit)) => GeocodeResult::resolved(hit),
            Ok(None) => GeocodeResult::not_found(),
            Err(e) => GeocodeResult::unavailable(e.to_string()),
        }
    }
}

/// External geocoding service
///
/// `Ok(None)` means the provider answered and found nothing.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    async fn geocode(&self, address: &str) -> Result<Option<GeocodeHit>, GeocodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let hit = GeocodeHit {
            latitude: 52.52,
            longitude: 13.40,
            display_name: "Berlin".to_string(),
        };
        assert_eq!(GeocodeResult::resolved(hit).status(), GeocodeStatus::Resolved);
        assert_eq!(GeocodeResult::not_found().status(), GeocodeStatus::NotFound);
        assert_eq!(
            GeocodeResult::unavailable("boom").status(),
            GeocodeStatus::Unavailable
        );
    }

    #[test]
    fn test_from_provider_outcome() {
        let not_found: GeocodeResult = Ok(None).into();
        assert!(!not_found.found);
        assert!(not_found.error_message.is_none());

        let failed: GeocodeResult = Err(GeocodeError::Timeout(10)).into();
        assert!(!failed.found);
        assert_eq!(
            failed.error_message.as_deref(),
            Some("Geocoding request timed out after 10 s")
        );
    }
}
