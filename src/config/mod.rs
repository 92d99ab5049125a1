// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration
//!
//! Everything is passed in at construction time. A TOML file provides the
//! base values, environment variables override them:
//!
//! ```toml
//! [sealer]
//! curve = "P-256"
//! iv_layout = "legacy"
//! enforce_key_expiry = true
//!
//! [sealer.key_derivation]
//! mode = "raw"
//!
//! [provider]
//! api_url = "https://api.example.com"
//! cache_ttl_secs = 1800
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::crypto::{CurveId, IvLayout, KeyDerivation};

pub const ENV_API_URL: &str = "CREDSEAL_API_URL";
pub const ENV_ACCESS_TOKEN: &str = "CREDSEAL_ACCESS_TOKEN";
pub const ENV_KEY_CACHE_TTL: &str = "CREDSEAL_KEY_CACHE_TTL";
pub const ENV_IV_LAYOUT: &str = "CREDSEAL_IV_LAYOUT";
pub const ENV_KDF: &str = "CREDSEAL_KDF";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Sealing parameters; the backend decoder must use the same values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SealerConfig {
    pub curve: CurveId,
    pub iv_layout: IvLayout,
    /// Reject server keys past their `expires_at`
    pub enforce_key_expiry: bool,
    pub key_derivation: KeyDerivation,
}

impl Default for SealerConfig {
    fn default() -> Self {
        Self {
            curve: CurveId::P256,
            iv_layout: IvLayout::Legacy,
            enforce_key_expiry: true,
            key_derivation: KeyDerivation::Raw,
        }
    }
}

/// Where and how to fetch the server public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_url: String,
    pub public_key_path: String,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            public_key_path: "/api/v1/connections/public-key".to_string(),
            cache_ttl_secs: 30 * 60,
            request_timeout_secs: 30,
            access_token: None,
        }
    }
}

impl ProviderConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL of the public key endpoint: `api_url` followed by
    /// `public_key_path`, keeping any path prefix in `api_url`
    pub fn public_key_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidValue {
            name: "provider.api_url".to_string(),
            reason: e.to_string(),
        })?;

        let path = self.public_key_path.trim_start_matches('/');
        let full = format!("{}/{}", self.api_url.trim_end_matches('/'), path);
        url::Url::parse(&full).map_err(|e| ConfigError::InvalidValue {
            name: "provider.public_key_path".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sealer: SealerConfig,
    pub provider: ProviderConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load the file if given, then overlay environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `CREDSEAL_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.provider.api_url = url;
        }

        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            let token = token.trim().to_string();
            self.provider.access_token = (!token.is_empty()).then_some(token);
        }

        if let Some(ttl) = lookup(ENV_KEY_CACHE_TTL) {
            self.provider.cache_ttl_secs =
                ttl.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::InvalidValue {
                        name: ENV_KEY_CACHE_TTL.to_string(),
                        reason: e.to_string(),
                    }
                })?;
        }

        if let Some(layout) = lookup(ENV_IV_LAYOUT) {
            self.sealer.iv_layout = layout
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    name: ENV_IV_LAYOUT.to_string(),
                    reason,
                })?;
        }

        if let Some(kdf) = lookup(ENV_KDF) {
            self.sealer.key_derivation = kdf.parse().map_err(|reason| ConfigError::InvalidValue {
                name: ENV_KDF.to_string(),
                reason,
            })?;
        }

        Ok(())
    }
}
