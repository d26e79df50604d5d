//! Nominatim (OpenStreetMap) geocoding client
//!
//! Nominatim usage policy: an identifying User-Agent is mandatory and clients
//! must not exceed one request per second.

use super::{GeocodeError, GeocodeHit, GeocodeProvider};
use async_trait::async_trait;
use hplan_common::config::GeocodingConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// One entry of the `format=jsonv2` search response
#[derive(Debug, Clone, Deserialize)]
struct NominatimPlace {
    /// Latitude as decimal string
    lat: String,
    /// Longitude as decimal string
    lon: String,
    display_name: String,
}

/// Spaces requests at least `min_interval` apart
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Nominatim search API client
pub struct NominatimClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    rate_limiter: Arc<RateLimiter>,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit())),
        })
    }

    fn parse_place(place: NominatimPlace) -> Result<GeocodeHit, GeocodeError> {
        let latitude = place
            .lat
            .parse::<f64>()
            .map_err(|e| GeocodeError::Parse(format!("Invalid latitude '{}': {}", place.lat, e)))?;
        let longitude = place
            .lon
            .parse::<f64>()
            .map_err(|e| GeocodeError::Parse(format!("Invalid longitude '{}': {}", place.lon, e)))?;

        Ok(GeocodeHit {
            latitude,
            longitude,
            display_name: place.display_name,
        })
    }
}

#[async_trait]
impl GeocodeProvider for NominatimClient {
    fn name(&self) -> &'static str {
        "Nominatim"
    }

    async fn geocode(&self, address: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/search", self.base_url);
        tracing::debug!(address = %address, url = %url, "Querying Nominatim");

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodeError::Timeout(self.timeout.as_secs())
                } else {
                    GeocodeError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api(status.as_u16(), error_text));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        match places.into_iter().next() {
            Some(place) => {
                let hit = Self::parse_place(place)?;
                tracing::info!(
                    address = %address,
                    latitude = hit.latitude,
                    longitude = hit.longitude,
                    "Resolved address via Nominatim"
                );
                Ok(Some(hit))
            }
            None => {
                tracing::info!(address = %address, "Nominatim found no match");
                Ok(None)
            }
        }
    }
}
