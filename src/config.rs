//! Configuration file handling
//!
//! The configuration is a TOML file with two sections:
//!
//! ```toml
//! [flashblade]
//! endpoint = "flashblade.example.com"
//! api_token = "T-0123..."
//! api_version = "1.8"
//! timeout_seconds = 30
//! insecure = true
//!
//! [usage]
//! filesystem_filter = "^home"
//! legacy_filter = false
//! format = "table"
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use crate::client::flashblade::DEFAULT_API_VERSION;
use crate::error::ConfigError;
use crate::report::OutputFormat;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub flashblade: FlashbladeConfig,
    pub usage: UsageConfig,
}

/// Connection settings for the array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlashbladeConfig {
    /// Host name or URL of the array's management interface
    pub endpoint: String,
    pub api_token: Option<String>,
    pub api_version: String,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Accept self-signed or otherwise invalid TLS certificates
    pub insecure: bool,
}

impl Default for FlashbladeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_seconds: 30,
            insecure: false,
        }
    }
}

/// What to collect and how to print it
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UsageConfig {
    /// Regex selecting file systems by name; empty selects all
    pub filesystem_filter: String,
    /// Treat an invalid filter as matching nothing instead of failing
    pub legacy_filter: bool,
    pub format: OutputFormat,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// - `ConfigError::ReadError` if the file cannot be read
    /// - `ConfigError::TomlError` if it is not valid TOML for this schema
    /// - `ConfigError::ValidationError` if a value is out of range
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that can be verified without contacting the array
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flashblade.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "flashblade.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.flashblade.api_version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "flashblade.api_version must not be empty".to_string(),
            ));
        }

        if self.flashblade.endpoint.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "flashblade.endpoint contains whitespace: '{}'",
                self.flashblade.endpoint
            )));
        }

        Ok(())
    }

    /// Check that everything needed to log in is present
    pub fn validate_connection(&self) -> Result<(), ConfigError> {
        if self.flashblade.endpoint.is_empty() {
            return Err(ConfigError::ValidationError(
                "no FlashBlade endpoint configured".to_string(),
            ));
        }

        match self.flashblade.api_token.as_deref() {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(ConfigError::ValidationError(
                "no FlashBlade API token configured".to_string(),
            )),
        }
    }

    /// Load configuration from an optional path
    ///
    /// A missing or unreadable file falls back to defaults with a warning; a
    /// file that exists but does not parse or validate is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                match Self::from_file(path) {
                    Ok(config) => Ok(config),
                    Err(ConfigError::ReadError(e)) => {
                        warn!("Configuration file not found or unreadable ({}), using defaults", e);
                        Ok(Self::default())
                    }
                    Err(e) => Err(e),
                }
            }
            None => {
                info!("Using default configuration");
                Ok(Self::default())
            }
        }
    }
}
