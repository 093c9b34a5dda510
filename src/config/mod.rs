//! Environment settings and the persisted application config.

pub mod watchlist;
pub mod whatsapp;

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::ConfigError;

pub use watchlist::WatchlistConfig;
pub use whatsapp::{Recipient, Transport, WhatsAppConfig};

pub const DEFAULT_FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";
pub const DEFAULT_CONFIG_PATH: &str = "stockwatch_config.json";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
/// Refresh intervals offered to users.
pub const REFRESH_INTERVALS_SECS: [u64; 4] = [30, 60, 120, 300];
pub const DEFAULT_PORT: u16 = 8080;

/// Deployment environment (`ENVIRONMENT`), `sandbox` unless set.
pub fn get_environment() -> String {
    env::var("ENVIRONMENT")
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_else(|_| "sandbox".to_string())
}

pub fn get_finnhub_api_key() -> Result<String, ConfigError> {
    env::var("FINNHUB_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or(ConfigError::MissingEnv("FINNHUB_API_KEY"))
}

pub fn get_finnhub_base_url() -> String {
    env::var("FINNHUB_BASE_URL").unwrap_or_else(|_| DEFAULT_FINNHUB_BASE_URL.to_string())
}

pub fn get_config_path() -> String {
    env::var("STOCKWATCH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub fn get_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

/// Everything the dashboard persists between restarts. Price history and debounce
/// state are not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub stocks: WatchlistConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stocks: WatchlistConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

impl AppConfig {
    /// Parse an exported document, rejecting invalid watch rules or an unsupported interval.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !REFRESH_INTERVALS_SECS.contains(&self.refresh_interval) {
            return Err(ConfigError::InvalidRefreshInterval);
        }
        Ok(())
    }

    /// Load from `path`, falling back to defaults when the file is absent or unusable.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
