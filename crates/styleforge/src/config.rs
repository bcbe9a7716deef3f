//! Account configuration for the mapping service.
//!
//! Credentials are always passed explicitly at construction time; there is
//! no environment-variable fallback.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Regional gateways the service is known to answer on.
pub const KNOWN_DOMAINS: [&str; 4] = [
    "us.atlas.microsoft.com",
    "eu.atlas.microsoft.com",
    "us.t-azmaps.azurelbs.com",
    "eu.t-azmaps.azurelbs.com",
];

pub const DEFAULT_API_VERSION: &str = "2.0";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Connection settings for one mapping-service account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    /// Gateway host, without scheme. Usually one of [`KNOWN_DOMAINS`].
    pub domain: String,

    /// Shared key sent as the `subscription-key` query parameter on every call.
    pub subscription_key: String,

    /// Value of the `api-version` query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl AccountConfig {
    pub fn new(
        domain: impl Into<String>,
        subscription_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            domain: domain.into(),
            subscription_key: subscription_key.into(),
            api_version: default_api_version(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "domain must not be empty".to_string(),
            });
        }
        if self.domain.contains("://") {
            return Err(ConfigError::Validation {
                message: format!("domain must be a bare host, got '{}'", self.domain),
            });
        }
        if self.subscription_key.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "subscription key must not be empty".to_string(),
            });
        }
        if self.api_version.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "api version must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// Manual Debug so the subscription key never lands in logs.
impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("domain", &self.domain)
            .field("subscription_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AccountConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<AccountConfig, ConfigError> {
    let config: AccountConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}
