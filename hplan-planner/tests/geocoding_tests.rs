//! Geocoding integration tests
//!
//! Real `NominatimClient` against a wiremock server, behind the cache and
//! driven through session workflows.

use chrono::Duration as ChronoDuration;
use hplan_common::config::GeocodingConfig;
use hplan_common::ManualClock;
use hplan_planner::geocode::{GeocodeCache, GeocodeStatus, NominatimClient};
use hplan_planner::workflow::{SessionState, SessionWorkflow};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADDRESS: &str = "Musterstraße 1, 12345 Musterstadt";

fn config_for(server: &MockServer) -> GeocodingConfig {
    GeocodingConfig {
        base_url: server.uri(),
        user_agent: "hplan-test/1.0".to_string(),
        timeout_secs: 2,
        cache_ttl_secs: 3600,
        rate_limit_ms: 0,
    }
}

async fn mount_known_address(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", ADDRESS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"lat": "52.52", "lon": "13.40", "display_name": "Musterstraße 1, 12345 Musterstadt, Deutschland"}
        ])))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn confirm_session(cache: &GeocodeCache, address: &str) -> SessionWorkflow {
    let mut session = SessionWorkflow::new();
    session.edit_size(500);
    session.edit_address(address);
    session.request_summary().unwrap();
    session.confirm(cache).await.unwrap();
    session
}

#[tokio::test]
async fn test_sessions_share_cached_lookup() {
    let server = MockServer::start().await;
    mount_known_address(&server, 1).await;

    let config = config_for(&server);
    let cache = GeocodeCache::new(
        Arc::new(NominatimClient::new(&config).unwrap()),
        Arc::new(ManualClock::default()),
        &config,
    );

    let first = confirm_session(&cache, ADDRESS).await;
    let second = confirm_session(&cache, ADDRESS).await;

    assert_eq!(first.state(), SessionState::Confirmed);
    assert_eq!(first.plot().geocode, second.plot().geocode);
    let geocode = first.plot().geocode.as_ref().unwrap();
    assert!(geocode.found);
    assert_eq!(
        geocode.resolved_address,
        "Musterstraße 1, 12345 Musterstadt, Deutschland"
    );
    // MockServer verifies expect(1) on drop
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let server = MockServer::start().await;
    mount_known_address(&server, 2).await;

    let config = config_for(&server);
    let clock = Arc::new(ManualClock::default());
    let cache = GeocodeCache::new(
        Arc::new(NominatimClient::new(&config).unwrap()),
        clock.clone(),
        &config,
    );

    cache.lookup(ADDRESS).await.unwrap();
    clock.advance(ChronoDuration::seconds(3601));
    cache.lookup(ADDRESS).await.unwrap();

    assert_eq!(cache.stats().await.provider_calls, 2);
}

#[tokio::test]
async fn test_provider_outage_degrades_and_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let cache = GeocodeCache::new(
        Arc::new(NominatimClient::new(&config).unwrap()),
        Arc::new(ManualClock::default()),
        &config,
    );

    let session = confirm_session(&cache, "Broken Road 5").await;
    assert_eq!(session.state(), SessionState::Confirmed);

    let geocode = session.plot().geocode.as_ref().unwrap();
    assert_eq!(geocode.status(), GeocodeStatus::Unavailable);
    assert_eq!(geocode.error_message.as_deref(), Some("API error 500: internal"));

    // Served from cache, provider not hit again
    let again = cache.lookup("Broken Road 5").await.unwrap();
    assert_eq!(&again, geocode);
}

#[tokio::test]
async fn test_provider_timeout_does_not_block_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.timeout_secs = 1;
    let cache = GeocodeCache::new(
        Arc::new(NominatimClient::new(&config).unwrap()),
        Arc::new(ManualClock::default()),
        &config,
    );

    let session = confirm_session(&cache, "Slow Lane 7").await;
    assert!(session.model_unlocked());
    let geocode = session.plot().geocode.as_ref().unwrap();
    assert!(!geocode.found);
    assert!(geocode.error_message.as_ref().unwrap().contains("timed out"));
}
