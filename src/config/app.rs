//! Main application configuration
//!
//! This module defines the primary configuration structures for the league
//! ratings service, including environment variable and TOML file loading
//! and validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub storage: StorageSettings,
    pub source: SourceSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address the HTTP API binds to
    pub host: String,
    /// Port for the HTTP API
    pub port: u16,
}

/// Persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding initial ratings, team names and saved state
    pub data_dir: PathBuf,
}

/// Result source settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// JSON file of game results used by `ingest`
    pub results_file: Option<PathBuf>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "league-ratings".to_string(),
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment-style names)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Service settings
        if let Some(name) = lookup("LEAGUE_SERVICE_NAME") {
            config.service.name = name;
        }
        if let Some(log_level) = lookup("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Some(host) = lookup("LEAGUE_HOST") {
            config.service.host = host;
        }
        if let Some(port) = lookup("LEAGUE_PORT") {
            config.service.port = port
                .parse()
                .map_err(|_| anyhow!("Invalid LEAGUE_PORT value: {}", port))?;
        }

        // Rating settings
        if let Some(k_factor) = lookup("LEAGUE_K_FACTOR") {
            config.rating.k_factor = k_factor
                .parse()
                .map_err(|_| anyhow!("Invalid LEAGUE_K_FACTOR value: {}", k_factor))?;
        }
        if let Some(home_advantage) = lookup("LEAGUE_HOME_ADVANTAGE") {
            config.rating.home_advantage = home_advantage.parse().map_err(|_| {
                anyhow!("Invalid LEAGUE_HOME_ADVANTAGE value: {}", home_advantage)
            })?;
        }

        // Storage and source settings
        if let Some(data_dir) = lookup("LEAGUE_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(data_dir);
        }
        if let Some(results_file) = lookup("LEAGUE_RESULTS_FILE") {
            config.source.results_file = Some(PathBuf::from(results_file));
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing keys take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Socket address for the HTTP API
    pub fn bind_address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.service.host, self.service.port)
            .parse()
            .context("Invalid API bind address")
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.port == 0 {
        return Err(anyhow!("API port cannot be 0"));
    }

    if config.storage.data_dir.as_os_str().is_empty() {
        return Err(anyhow!("Data directory cannot be empty"));
    }

    config.rating.validate()?;

    Ok(())
}
