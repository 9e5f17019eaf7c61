//! Service configuration.
//!
//! Loaded from TOML, every field defaulted, then overridden from
//! `SHIPMENT_*` environment variables.
//!
//! ```toml
//! [limits]
//! max_text_len = 255
//!
//! [auth]
//! min_password_len = 6
//! token_bytes = 32
//! hash_cost = 10
//!
//! [storage]
//! path = "shipments.json"
//!
//! [audit]
//! enabled = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::input::{RegistrationValidator, ShipmentValidator};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read config file '{}': {source}", path.display())]
    ReadFile {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config file '{}': {source}", path.display())]
    ParseToml {
        /// File that could not be parsed
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Invalid environment variable value.
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar {
        /// Variable name
        name: String,
        /// What was expected
        message: String,
    },
}

impl ConfigError {
    fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Input size limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum characters in addresses, classifications and names
    pub max_text_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_text_len: 255 }
    }
}

/// Credential settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Minimum password length at registration
    pub min_password_len: usize,
    /// Random bytes in an issued token secret
    pub token_bytes: usize,
    /// bcrypt cost for stored passwords
    pub hash_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_len: 6,
            token_bytes: 32,
            hash_cost: 10,
        }
    }
}

/// Shipment storage location; no path means in-memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the repository
    pub path: Option<PathBuf>,
}

/// Audit settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Emit audit events
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// `[limits]`
    pub limits: LimitsConfig,
    /// `[auth]`
    pub auth: AuthConfig,
    /// `[storage]`
    pub storage: StorageConfig,
    /// `[audit]`
    pub audit: AuditConfig,
}

impl ServiceConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseToml`] on malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::ParseToml {
            path: PathBuf::from("<string>"),
            source,
        })
    }

    /// Loads `path` and applies environment overrides.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or an
    /// override is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&raw).map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            tracing::debug!(path = %path.display(), "config file missing, using defaults");
            Self::default()
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Applies `SHIPMENT_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] for unparsable values.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] for unparsable values.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("SHIPMENT_MAX_TEXT_LEN") {
            self.limits.max_text_len = parse_positive("SHIPMENT_MAX_TEXT_LEN", &val)?;
        }
        if let Some(val) = lookup("SHIPMENT_MIN_PASSWORD_LEN") {
            self.auth.min_password_len = parse_positive("SHIPMENT_MIN_PASSWORD_LEN", &val)?;
        }
        if let Some(val) = lookup("SHIPMENT_STORAGE_PATH") {
            self.storage.path = (!val.is_empty()).then(|| PathBuf::from(val));
        }
        if let Some(val) = lookup("SHIPMENT_AUDIT") {
            self.audit.enabled = parse_bool(&val)
                .ok_or_else(|| ConfigError::invalid_env_var("SHIPMENT_AUDIT", "expected bool"))?;
        }
        Ok(())
    }

    /// Validator for shipment forms under these limits.
    pub fn shipment_validator(&self) -> ShipmentValidator {
        ShipmentValidator::new(self.limits.max_text_len)
    }

    /// Validator for registration forms under these limits.
    pub fn registration_validator(&self) -> RegistrationValidator {
        RegistrationValidator::new(self.limits.max_text_len, self.auth.min_password_len)
    }
}

fn parse_positive(name: &str, val: &str) -> Result<usize, ConfigError> {
    match val.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::invalid_env_var(name, "expected positive integer")),
    }
}

/// Accepts "true", "false", "1", "0", "yes", "no", "on", "off" (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
