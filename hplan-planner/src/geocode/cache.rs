//! Geocode result cache
//!
//! Memoizes address → `GeocodeResult` for a fixed TTL. Both successes and
//! failures are stored, so an unresolvable address reaches the provider at
//! most once per TTL window. Lookups of the same key are single-flight: while
//! one caller is waiting on the provider, others wait on a per-key lock and
//! then read the freshly stored entry.

use super::{GeocodeError, GeocodeProvider, GeocodeResult, GeocodeStatus};
use chrono::{DateTime, Utc};
use hplan_common::config::GeocodingConfig;
use hplan_common::{Clock, Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    result: GeocodeResult,
    created_at: DateTime<Utc>,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub live_entries: usize,
    pub expired_entries: usize,
    pub provider_calls: u64,
}

/// TTL cache in front of a `GeocodeProvider`
pub struct GeocodeCache {
    provider: Arc<dyn GeocodeProvider>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    timeout: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    provider_calls: AtomicU64,
}

impl GeocodeCache {
    pub fn new(
        provider: Arc<dyn GeocodeProvider>,
        clock: Arc<dyn Clock>,
        config: &GeocodingConfig,
    ) -> Self {
        Self::with_settings(provider, clock, config.cache_ttl(), config.timeout())
    }

    pub fn with_settings(
        provider: Arc<dyn GeocodeProvider>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        Self {
            provider,
            clock,
            ttl,
            timeout,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            provider_calls: AtomicU64::new(0),
        }
    }

    /// Cache key for an address
    pub fn normalize(address: &str) -> String {
        address.trim().to_string()
    }

    /// Resolve `address`, calling the provider only when no live entry exists
    ///
    /// An empty address is a caller error.
    pub async fn lookup(&self, address: &str) -> Result<GeocodeResult> {
        let key = Self::normalize(address);
        if key.is_empty() {
            return Err(Error::InvalidInput(
                "Cannot geocode an empty address".to_string(),
            ));
        }

        if let Some(result) = self.get_live(&key).await {
            debug!(address = %key, "Geocode cache hit");
            return Ok(result);
        }

        let key_lock = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = key_lock.lock().await;

        // Another caller may have filled the entry while we waited
        if let Some(result) = self.get_live(&key).await {
            debug!(address = %key, "Geocode cache filled by concurrent lookup");
            return Ok(result);
        }

        debug!(address = %key, "Geocode cache miss");
        let result = self.fetch(&key).await;
        self.store(&key, result.clone()).await;

        self.in_flight.lock().await.remove(&key);
        Ok(result)
    }

    async fn get_live(&self, key: &str) -> Option<GeocodeResult> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| entry.result.clone())
    }

    fn is_live(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.created_at <= self.ttl
    }

    async fn fetch(&self, address: &str) -> GeocodeResult {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);

        let outcome = match tokio::time::timeout(self.timeout, self.provider.geocode(address)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(GeocodeError::Timeout(self.timeout.as_secs())),
        };
        let result = GeocodeResult::from(outcome);

        match result.status() {
            GeocodeStatus::Resolved => {}
            GeocodeStatus::NotFound => {
                info!(address = %address, provider = self.provider.name(), "Address not found")
            }
            GeocodeStatus::Unavailable => warn!(
                address = %address,
                provider = self.provider.name(),
                error = result.error_message.as_deref().unwrap_or_default(),
                "Geocoding unavailable, caching failure"
            ),
        }

        result
    }

    async fn store(&self, key: &str, result: GeocodeResult) {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        // Drop expired entries while we hold the write lock
        let ttl = self.ttl;
        entries.retain(|_, entry| now - entry.created_at <= ttl);

        entries.insert(
            key.to_string(),
            CacheEntry {
                result,
                created_at: now,
            },
        );
    }

    pub async fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        let live_entries = entries.values().filter(|e| self.is_live(e, now)).count();
        CacheStats {
            live_entries,
            expired_entries: entries.len() - live_entries,
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
        }
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
