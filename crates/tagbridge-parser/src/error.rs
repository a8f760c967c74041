//! Error types for the Parser

use thiserror::Error;

/// Errors that fail a whole source unit.
///
/// A record that simply is not a route is not an error; see
/// [`Rejection`](crate::Rejection).
#[derive(Error, Debug)]
pub enum ParseError {
    /// No record carries the module-identity tag
    #[error("No @module tag found in source unit")]
    MissingModule,

    /// The module-identity tag has an empty payload
    #[error("@module tag has no controller name")]
    EmptyModuleName,

    /// The comment extractor failed
    #[error("Comment extraction failed: {0}")]
    Extract(Box<dyn std::error::Error + Send + Sync>),
}
