use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "/etc/tracker-hub/config.json";

const DEFAULT_DB_PATH: &str = "/var/lib/tracker-hub/hub.db";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub database_path: Option<String>,
    pub bind_address: Option<String>,
    pub log_filter: Option<String>,
    pub secure_cookies: Option<bool>,
    /// Base64 AES-256 key used to encrypt stored identity passwords.
    pub secret_key: Option<String>,
}

impl HubConfig {
    /// Loads the config file named by `TRACKER_HUB_CONFIG_PATH`, or the default path.
    ///
    /// # Errors
    ///
    /// This function will return an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TRACKER_HUB_CONFIG_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        Self::load_from(&config_path)
    }

    /// Loads an explicit config file; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// This function will return an error if the file exists but cannot be read or parsed.
    pub fn load_from(config_path: &str) -> Result<Self> {
        let path = Path::new(config_path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {config_path}"))?;

        let config = serde_json::from_str::<Self>(&raw)
            .with_context(|| format!("Failed to parse config JSON: {config_path}"))?;

        Ok(config)
    }

    #[must_use]
    pub fn database_path(&self) -> String {
        self.database_path
            .clone()
            .or_else(|| std::env::var("TRACKER_HUB_DB_PATH").ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        self.bind_address
            .clone()
            .or_else(|| std::env::var("TRACKER_HUB_BIND").ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string())
    }

    #[must_use]
    pub fn log_filter(&self) -> String {
        self.log_filter
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_LOG_FILTER)
            .to_string()
    }

    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies.unwrap_or(false)
    }

    #[must_use]
    pub fn secret_key(&self) -> Option<String> {
        self.secret_key
            .clone()
            .or_else(|| std::env::var("TRACKER_HUB_SECRET_KEY").ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}
