//! Configuration management for Electro Cars
//!
//! This module handles loading and validation of the application
//! configuration from YAML files. Defaults mirror the vendor's production
//! endpoints and the cadence used by the fleet app.

use crate::error::{ElectroCarsError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "ELECTROCARS_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Vendor API endpoints and transport settings
    pub api: ApiConfig,

    /// Adaptive polling cadence
    pub polling: PollingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,

    /// Where the phone number and refresh token are persisted
    pub credentials_file: String,
}

/// Vendor API settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the authentication gateway (send-code, token, refresh)
    pub auth_base: String,

    /// Base URL of the fleet API (cars, device commands)
    pub fleet_base: String,

    /// Application identifier sent as `x-app-id` on auth calls
    pub app_id: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Page size for the car listing
    pub page_limit: u32,
}

/// Polling cadence, all values in seconds
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PollingConfig {
    /// Interval while any car is moving or charging
    pub active_interval_secs: u64,

    /// Interval shortly after the fleet went quiet
    pub cooling_interval_secs: u64,

    /// Interval once the fleet has been quiet for `idle_after_secs`
    pub idle_interval_secs: u64,

    /// Quiet time after which the fleet is considered idle
    pub idle_after_secs: u64,

    /// Interval in effect before the first successful poll
    pub initial_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Log file path or directory
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WebConfig {
    /// Serve the HTTP API at all
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PollingConfig {
    pub fn active_interval(&self) -> Duration {
        Duration::from_secs(self.active_interval_secs)
    }

    pub fn cooling_interval(&self) -> Duration {
        Duration::from_secs(self.cooling_interval_secs)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }

    pub fn idle_after(&self) -> Duration {
        Duration::from_secs(self.idle_after_secs)
    }

    pub fn initial_interval(&self) -> Duration {
        Duration::from_secs(self.initial_interval_secs)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first location that exists
    pub fn load() -> Result<Self> {
        if let Some(explicit) = std::env::var_os(CONFIG_PATH_ENV) {
            let path = Path::new(&explicit);
            if !path.exists() {
                return Err(ElectroCarsError::config(format!(
                    "{} points at missing file {}",
                    CONFIG_PATH_ENV,
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        let default_paths = [
            "electrocars_config.yaml",
            "/data/electrocars_config.yaml",
            "/etc/electrocars/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (field, url) in [
            ("api.auth_base", &self.api.auth_base),
            ("api.fleet_base", &self.api.fleet_base),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ElectroCarsError::validation(
                    field,
                    "Must be an http(s) URL",
                ));
            }
        }

        if self.api.app_id.trim().is_empty() {
            return Err(ElectroCarsError::validation(
                "api.app_id",
                "Application id cannot be empty",
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ElectroCarsError::validation(
                "api.request_timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.api.page_limit == 0 {
            return Err(ElectroCarsError::validation(
                "api.page_limit",
                "Must be greater than 0",
            ));
        }

        let p = &self.polling;
        if p.active_interval_secs == 0
            || p.cooling_interval_secs == 0
            || p.idle_interval_secs == 0
            || p.initial_interval_secs == 0
        {
            return Err(ElectroCarsError::validation(
                "polling",
                "Intervals must be greater than 0",
            ));
        }

        if p.active_interval_secs > p.cooling_interval_secs
            || p.cooling_interval_secs > p.idle_interval_secs
        {
            return Err(ElectroCarsError::validation(
                "polling",
                "Expected active <= cooling <= idle interval",
            ));
        }

        if self.credentials_file.trim().is_empty() {
            return Err(ElectroCarsError::validation(
                "credentials_file",
                "Path cannot be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.request_timeout_secs, 10);
        assert_eq!(config.api.page_limit, 100);
        assert_eq!(config.polling.active_interval(), Duration::from_secs(300));
        assert_eq!(config.polling.cooling_interval(), Duration::from_secs(600));
        assert_eq!(config.polling.idle_interval(), Duration::from_secs(3600));
        assert_eq!(config.polling.idle_after(), Duration::from_secs(600));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.api.fleet_base = "fleet-api.example".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.api.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.polling.active_interval_secs = 7200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "polling:\n  active_interval_secs: 120\nweb:\n  port: 9000\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.polling.active_interval_secs, 120);
        assert_eq!(config.polling.idle_interval_secs, 3600);
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, "127.0.0.1");
    }
}
