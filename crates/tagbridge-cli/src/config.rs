//! Configuration loading for the CLI.

use crate::error::Result;
use std::path::Path;
use tagbridge_router::BridgeConfig;

/// Load the bridge configuration from `path`, or defaults when none is given.
pub fn load(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => Ok(BridgeConfig::from_file(path)?),
        None => Ok(BridgeConfig::default()),
    }
}
