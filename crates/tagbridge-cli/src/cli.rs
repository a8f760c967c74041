//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tagbridge CLI - Inspect routes declared in controller doc comments.
#[derive(Debug, Parser)]
#[command(name = "tagbridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Bridge configuration file (TOML)
    #[arg(short, long, global = true, env = "TAGBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log loading and route registration to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (verb and path only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the route table declared by controller units
    Routes(RoutesArgs),
}

/// Arguments for the routes command.
#[derive(Debug, Parser)]
pub struct RoutesArgs {
    /// Controller unit paths; the configured suffix is tried when a path
    /// does not exist as given
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Only show routes of this controller
    #[arg(long)]
    pub controller: Option<String>,
}

impl From<CliFormat> for crate::output::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::output::OutputFormat::Table,
            CliFormat::Json => crate::output::OutputFormat::Json,
            CliFormat::Quiet => crate::output::OutputFormat::Quiet,
        }
    }
}

impl Cli {
    /// Tracing filter directive for the requested verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}
