//! Output formatting for the CLI.

use crate::error::Result;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use tagbridge_domain::{ControllerDescriptor, Verb};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Route table as JSON
    Json,
    /// One `VERB /path` line per route
    Quiet,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a route table.
    pub fn format_routes(&self, controllers: &[ControllerDescriptor]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(controllers)?),
            OutputFormat::Table => Ok(self.format_routes_table(controllers)),
            OutputFormat::Quiet => Ok(self.format_routes_quiet(controllers)),
        }
    }

    fn format_routes_table(&self, controllers: &[ControllerDescriptor]) -> String {
        if controllers.iter().all(|c| c.methods.is_empty()) {
            return self.warning("No routes found.");
        }

        let mut builder = Builder::default();
        builder.push_record(["Verb", "Path", "Handler", "Params", "Returns"]);

        for controller in controllers {
            for route in &controller.methods {
                builder.push_record([
                    self.verb(route.verb),
                    route.path.clone(),
                    format!("{}.{}", controller.name, route.name),
                    route.signature(),
                    route.returns.type_name.clone(),
                ]);
            }
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    fn format_routes_quiet(&self, controllers: &[ControllerDescriptor]) -> String {
        controllers
            .iter()
            .flat_map(|c| &c.methods)
            .map(|route| format!("{} {}", route.verb.as_str().to_uppercase(), route.path))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        if self.color_enabled {
            format!("⚠ {}", message).yellow().to_string()
        } else {
            format!("⚠ {}", message)
        }
    }

    fn verb(&self, verb: Verb) -> String {
        let label = verb.as_str().to_uppercase();
        if !self.color_enabled {
            return label;
        }
        match verb {
            Verb::Get => label.green().to_string(),
            Verb::Post => label.yellow().to_string(),
        }
    }
}
