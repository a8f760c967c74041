//! Tagbridge CLI - inspect routes declared in controller doc comments.

use anyhow::Context;
use clap::Parser;
use tagbridge_cli::{commands, config};
use tagbridge_cli::{Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr so table and JSON output stay clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load {}", path.display()),
        None => "Failed to load default configuration".to_string(),
    })?;

    let formatter = Formatter::new(cli.format.into(), !cli.no_color);

    match cli.command {
        Command::Routes(args) => commands::execute_routes(args, &config, &formatter).await?,
    }

    Ok(())
}
