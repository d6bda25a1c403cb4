//! Configuration system for mediaflux.
//!
//! Provides layered configuration from multiple sources:
//!
//! 1. **Compiled defaults** - Dev-instance defaults built into the binary
//! 2. **User config file** - `~/.config/mediaflux/config.toml`
//! 3. **Environment variables** - `INFLUX_*` for the store, `MEDIAFLUX_*` for defaults
//!
//! The loaded [`Config`] is constructed once at program entry and passed by
//! reference into the client; nothing in the crate reads the environment
//! after startup.
//!
//! # Example Configuration File
//!
//! ```toml
//! [store]
//! url = "http://localhost:8086"
//! token = "bigdata-dev-token"
//! org = "bigdata"
//! bucket = "bigdata_bucket"
//!
//! [query]
//! article_lookback = "1h"
//! post_lookback = "30d"
//! default_limit = 500
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Main configuration structure for mediaflux.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backing time-series store connection settings.
    pub store: StoreConfig,
    /// Default query parameters.
    pub query: QueryConfig,
}

/// Connection settings for the backing time-series store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the store.
    /// Environment variable: `INFLUX_URL`
    pub url: String,

    /// API token used for authentication.
    /// Environment variable: `INFLUX_TOKEN`
    pub token: String,

    /// Organization name.
    /// Environment variable: `INFLUX_ORG`
    pub org: String,

    /// Bucket that holds article and post points.
    /// Environment variable: `INFLUX_BUCKET`
    pub bucket: String,
}

/// Default query parameters used when the caller does not supply any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Lookback window for article reads.
    /// Environment variable: `MEDIAFLUX_ARTICLE_LOOKBACK`
    pub article_lookback: String,

    /// Lookback window for post reads.
    /// Environment variable: `MEDIAFLUX_POST_LOOKBACK`
    pub post_lookback: String,

    /// Default result limit for windowed reads.
    /// Environment variable: `MEDIAFLUX_LIMIT`
    pub default_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            token: "bigdata-dev-token".to_string(),
            org: "bigdata".to_string(),
            bucket: "bigdata_bucket".to_string(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            article_lookback: "1h".to_string(),
            post_lookback: "30d".to_string(),
            default_limit: 500,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. User config file (~/.config/mediaflux/config.toml)
    /// 3. Compiled defaults
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load from user config file
        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        // Override from environment variables
        config.apply_env_overrides();

        debug!("Configuration loaded: {:?}", config);
        config
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &PathBuf) -> Option<Self> {
        if !path.exists() {
            debug!("Config file not found: {}", path.display());
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    info!("Loaded config from: {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse config file {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load the user configuration file from the standard location.
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Get the path to the user configuration file.
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mediaflux").join("config.toml"))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // Store overrides
        if let Ok(url) = std::env::var("INFLUX_URL") {
            self.store.url = url;
        }
        if let Ok(token) = std::env::var("INFLUX_TOKEN") {
            self.store.token = token;
        }
        if let Ok(org) = std::env::var("INFLUX_ORG") {
            self.store.org = org;
        }
        if let Ok(bucket) = std::env::var("INFLUX_BUCKET") {
            self.store.bucket = bucket;
        }

        // Query overrides
        if let Ok(lookback) = std::env::var("MEDIAFLUX_ARTICLE_LOOKBACK") {
            self.query.article_lookback = lookback;
        }
        if let Ok(lookback) = std::env::var("MEDIAFLUX_POST_LOOKBACK") {
            self.query.post_lookback = lookback;
        }
        if let Ok(limit) = std::env::var("MEDIAFLUX_LIMIT") {
            if let Ok(n) = limit.parse() {
                self.query.default_limit = n;
            }
        }
    }

    /// Merge another config into this one (other takes precedence).
    fn merge(&mut self, other: Self) {
        self.store = other.store;
        self.query = other.query;
    }

    /// Generate a default configuration file content.
    #[must_use]
    pub fn default_config_content() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
