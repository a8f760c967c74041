//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading or routing failed
    #[error("Bridge error: {0}")]
    Bridge(#[from] tagbridge_router::BridgeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] tagbridge_router::ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
