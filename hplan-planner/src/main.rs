//! hplan-planner - House planner web service
//!
//! Collects plot data and design preferences, geocodes the plot address and,
//! once the summary is confirmed, shows the static house model.

use anyhow::Result;
use clap::Parser;
use hplan_common::config::{ConfigOverrides, ConfigResolver};
use hplan_common::SystemClock;
use hplan_planner::geocode::{GeocodeCache, NominatimClient};
use hplan_planner::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hplan-planner", version, about = "House planner: plot & preferences")]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

/// Install the global subscriber; RUST_LOG wins over the configured level
fn init_tracing(configured_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(
        "hplan-planner",
        ConfigOverrides {
            config_path: args.config,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
        },
    );
    let resolved = resolver.resolve()?;
    init_tracing(&resolved.config.logging.level);
    resolved.report();
    let config = resolved.config;

    info!(
        "Starting hplan-planner v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let provider = NominatimClient::new(&config.geocoding)?;
    info!(
        base_url = %config.geocoding.base_url,
        timeout_secs = config.geocoding.timeout_secs,
        cache_ttl_secs = config.geocoding.cache_ttl_secs,
        "Geocoding provider ready"
    );
    let cache = GeocodeCache::new(Arc::new(provider), Arc::new(SystemClock), &config.geocoding);

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(Arc::new(cache), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
