//! Shared fixtures for hplan-planner integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use hplan_common::config::TomlConfig;
use hplan_common::ManualClock;
use hplan_planner::geocode::{GeocodeCache, GeocodeError, GeocodeHit, GeocodeProvider};
use hplan_planner::AppState;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const KNOWN_ADDRESS: &str = "Musterstraße 1, 12345 Musterstadt";

/// Resolves `KNOWN_ADDRESS` to (52.52, 13.40); everything else is not found
#[derive(Default)]
pub struct StubProvider {
    pub calls: AtomicUsize,
}

impl StubProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodeProvider for StubProvider {
    fn name(&self) -> &'static str {
        "Stub"
    }

    async fn geocode(&self, address: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if address == KNOWN_ADDRESS {
            Ok(Some(GeocodeHit {
                latitude: 52.52,
                longitude: 13.40,
                display_name: KNOWN_ADDRESS.to_string(),
            }))
        } else {
            Ok(None)
        }
    }
}

/// App state backed by the stub provider and a frozen clock
pub fn test_app_state() -> (AppState, Arc<StubProvider>) {
    let (state, provider, _) = test_app_state_with_clock();
    (state, provider)
}

/// Same as `test_app_state`, exposing the clock that drives cache and
/// session expiry
pub fn test_app_state_with_clock() -> (AppState, Arc<StubProvider>, Arc<ManualClock>) {
    let provider = Arc::new(StubProvider::default());
    let clock = Arc::new(ManualClock::default());
    let cache = GeocodeCache::with_settings(
        provider.clone(),
        clock.clone(),
        Duration::from_secs(3600),
        Duration::from_secs(10),
    );
    let state = AppState::with_clock(Arc::new(cache), TomlConfig::default(), clock.clone());
    (state, provider, clock)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
