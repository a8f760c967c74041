//! Trait definitions for external interactions
//!
//! The comment-block extractor is an external collaborator. The parser crate
//! ships a default implementation for Rust doc comments.

use crate::DocRecord;

/// Turns source text into documentation records
pub trait CommentParser: Send + Sync {
    /// Error type for extraction failures
    type Error: std::error::Error + Send + Sync + 'static;

    /// Extract every documented symbol in `source`, in source order
    fn parse_comments(&self, source: &str) -> Result<Vec<DocRecord>, Self::Error>;
}
