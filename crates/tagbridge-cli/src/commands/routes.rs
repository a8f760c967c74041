//! Routes command implementation.

use crate::cli::RoutesArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use serde_json::Value;
use std::path::Path;
use tagbridge_domain::ControllerDescriptor;
use tagbridge_router::{Bridge, BridgeConfig, Controller, ControllerResolver, ResolveError};
use tracing::info;

/// Resolves every controller to an empty implementation; routes are only
/// inspected, never served
struct InspectResolver;

impl ControllerResolver for InspectResolver {
    fn resolve(&self, _name: &str, _source: &Path, _args: &[Value]) -> std::result::Result<Controller, ResolveError> {
        Ok(Controller::new())
    }
}

/// Load `args.paths` and return the route table, filtered by controller
pub async fn collect_routes(args: &RoutesArgs, config: &BridgeConfig) -> Result<Vec<ControllerDescriptor>> {
    let mut bridge = Bridge::new(InspectResolver).with_config(config);
    let summary = bridge.include(&args.paths).await?;
    info!(loaded = summary.loaded, skipped = summary.skipped, "Controller units processed");

    let controllers: Vec<ControllerDescriptor> = bridge
        .mapping()
        .await?
        .iter()
        .filter(|c| args.controller.as_deref().map_or(true, |name| c.name == name))
        .cloned()
        .collect();

    if let Some(name) = &args.controller {
        if controllers.is_empty() {
            return Err(CliError::InvalidInput(format!("No controller named {}", name)));
        }
    }

    Ok(controllers)
}

/// Execute the routes command.
pub async fn execute_routes(args: RoutesArgs, config: &BridgeConfig, formatter: &Formatter) -> Result<()> {
    let controllers = collect_routes(&args, config).await?;
    println!("{}", formatter.format_routes(&controllers)?);
    Ok(())
}
