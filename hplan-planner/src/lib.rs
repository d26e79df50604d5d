//! hplan-planner library interface
//!
//! Core: `models` (plot, survey), `geocode` (provider + TTL cache) and
//! `workflow` (session state machine). `presentation` renders core state as
//! HTML; `api` exposes pages, the JSON action API and health.

pub mod api;
pub mod error;
pub mod geocode;
pub mod models;
pub mod presentation;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use geocode::GeocodeCache;
use hplan_common::config::TomlConfig;
use hplan_common::{Clock, SystemClock};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use workflow::SessionRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live planning sessions
    pub sessions: Arc<SessionRegistry>,
    /// Geocode cache shared by all sessions
    pub geocode_cache: Arc<GeocodeCache>,
    /// Effective configuration
    pub config: Arc<TomlConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(geocode_cache: Arc<GeocodeCache>, config: TomlConfig) -> Self {
        Self::with_clock(geocode_cache, config, Arc::new(SystemClock))
    }

    /// Session expiry driven by `clock`
    pub fn with_clock(
        geocode_cache: Arc<GeocodeCache>,
        config: TomlConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new(
                clock,
                config.sessions.idle_timeout(),
            )),
            geocode_cache,
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // JSON API
        .merge(api::session_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
