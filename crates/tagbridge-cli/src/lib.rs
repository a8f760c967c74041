//! Tagbridge CLI library.
//!
//! Inspects annotated controller units from the command line: argument
//! parsing, command execution and route table formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use error::{CliError, Result};
pub use output::{Formatter, OutputFormat};
