//! Configuration for the bridge.
//!
//! Serializable settings load from TOML; the error filter is a runtime
//! option because it is code, not data.

use crate::controller::{ControllerError, DEFAULT_STATUS_PROPERTY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Bridge configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A field holds an unusable value
    #[error("Invalid configuration field {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Bridge configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Property read off a failure value for the HTTP status (default: `httpCode`)
    #[serde(default = "default_status_property")]
    pub error_status_property: String,

    /// Suffix appended to a load path that does not exist as given (default: `.rs`)
    #[serde(default = "default_source_suffix")]
    pub source_suffix: String,
}

fn default_status_property() -> String {
    DEFAULT_STATUS_PROPERTY.to_string()
}

fn default_source_suffix() -> String {
    ".rs".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            error_status_property: default_status_property(),
            source_suffix: default_source_suffix(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.error_status_property.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "error_status_property",
                reason: "must not be empty".to_string(),
            });
        }
        if self.source_suffix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid {
                field: "source_suffix",
                reason: format!("{:?} contains a path separator", self.source_suffix),
            });
        }
        Ok(())
    }
}

/// Turns a failure into the value sent to the client
pub type ErrorFilter = Arc<dyn Fn(&ControllerError) -> Value + Send + Sync>;

/// How failed invocations are reported to clients
#[derive(Clone)]
pub struct ErrorPolicy {
    /// Property read for the HTTP status
    pub status_property: String,
    /// Filter applied before sending
    pub filter: ErrorFilter,
}

impl ErrorPolicy {
    /// Policy with the given status property and the identity filter
    pub fn new(status_property: impl Into<String>) -> Self {
        Self {
            status_property: status_property.into(),
            filter: Arc::new(ControllerError::to_value),
        }
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_PROPERTY)
    }
}

impl std::fmt::Debug for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorPolicy")
            .field("status_property", &self.status_property)
            .finish_non_exhaustive()
    }
}
