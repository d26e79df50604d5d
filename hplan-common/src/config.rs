//! Configuration loading
//!
//! Resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the module warns and starts with
//! defaults. A TOML file that exists but cannot be parsed is a `Config` error.
//!
//! Resolution runs before the tracing subscriber exists (the log level is
//! part of the config), so it does not log. It returns a `ResolvedConfig`
//! whose `report()` emits the notes once logging is up.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG_PATH: &str = "HPLAN_CONFIG";

/// Environment variable overriding the HTTP port
pub const ENV_PORT: &str = "HPLAN_PORT";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub geocoding: GeocodingConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub sessions: SessionConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Geocoding provider and cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Nominatim base URL (no trailing slash)
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,

    /// User-Agent sent to the provider (required by Nominatim usage policy)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upper bound for a single provider call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long a cached result (success or failure) stays live
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Minimum spacing between provider requests
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

/// Static 3D model shown after confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Iframe source for the model viewer; a placeholder is shown when unset
    #[serde(default)]
    pub embed_url: Option<String>,

    #[serde(default = "default_model_title")]
    pub title: String,
}

/// In-memory session retention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions untouched for longer than this are dropped
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5741
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    format!("house_planner/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_rate_limit_ms() -> u64 {
    1000
}

fn default_idle_timeout_secs() -> u64 {
    2 * 3600
}

fn default_model_title() -> String {
    "Your future home".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            geocoding: GeocodingConfig::default(),
            model: ModelConfig::default(),
            sessions: SessionConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            rate_limit_ms: default_rate_limit_ms(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embed_url: None,
            title: default_model_title(),
        }
    }
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from this TOML file
    File(PathBuf),
    /// Compiled defaults; holds the file that was looked for, if any
    Defaults(Option<PathBuf>),
}

/// Outcome of `ConfigResolver::resolve`
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
    /// Ignored settings, in the order they were found
    pub warnings: Vec<String>,
}

impl ResolvedConfig {
    /// Log where the config came from plus any ignored settings
    pub fn report(&self) {
        match &self.source {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults(Some(path)) => warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            ),
            ConfigSource::Defaults(None) => {
                warn!("Could not determine config directory, using compiled defaults")
            }
        }
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}

/// Resolves the effective configuration for one module
pub struct ConfigResolver {
    module_name: String,
    overrides: ConfigOverrides,
}

impl ConfigResolver {
    pub fn new(module_name: &str, overrides: ConfigOverrides) -> Self {
        Self {
            module_name: module_name.to_string(),
            overrides,
        }
    }

    /// Config file location: CLI → ENV → platform config directory
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.overrides.config_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path(&self.module_name)
    }

    /// Build the effective configuration
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let mut warnings = Vec::new();

        let (mut config, source) = match self.config_path() {
            Some(path) if path.exists() => (load_toml_config(&path)?, ConfigSource::File(path)),
            missing => (TomlConfig::default(), ConfigSource::Defaults(missing)),
        };

        // Tier 2: environment beats TOML
        if let Ok(port) = std::env::var(ENV_PORT) {
            match port.trim().parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => warnings.push(format!("Ignoring invalid {}='{}'", ENV_PORT, port)),
            }
        }

        // Tier 1: command line beats everything
        if let Some(host) = &self.overrides.host {
            config.host = host.clone();
        }
        if let Some(port) = self.overrides.port {
            config.port = port;
        }
        if let Some(level) = &self.overrides.log_level {
            config.logging.level = level.clone();
        }

        validate(&config)?;
        Ok(ResolvedConfig {
            config,
            source,
            warnings,
        })
    }
}

/// `<config_dir>/hplan/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hplan").join(format!("{}.toml", module_name)))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

fn validate(config: &TomlConfig) -> Result<()> {
    if config.geocoding.timeout_secs == 0 {
        return Err(Error::Config(
            "geocoding.timeout_secs must be greater than zero".to_string(),
        ));
    }
    if config.sessions.idle_timeout_secs == 0 {
        return Err(Error::Config(
            "sessions.idle_timeout_secs must be greater than zero".to_string(),
        ));
    }
    if config.geocoding.base_url.trim().is_empty() {
        return Err(Error::Config("geocoding.base_url must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.port, 5741);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.geocoding.timeout(), Duration::from_secs(10));
        assert_eq!(config.geocoding.cache_ttl(), Duration::from_secs(3600));
        assert!(config.model.embed_url.is_none());
        assert_eq!(config.sessions.idle_timeout(), Duration::from_secs(7200));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 8080
            [geocoding]
            cache_ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.geocoding.cache_ttl_secs, 60);
        assert_eq!(config.geocoding.timeout_secs, 10);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = TomlConfig::default();
        config.geocoding.timeout_secs = 0;
        assert!(matches!(validate(&config), Err(Error::Config(_))));
    }
}
