//! Loading of one controller unit from disk.
//!
//! A unit is located (retrying once with the configured suffix), read,
//! parsed into a [`ControllerDescriptor`] and paired with the implementation
//! the resolver hands out for its name.

use crate::controller::{Controller, ControllerResolver, ResolveError};
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagbridge_domain::{CommentParser, ControllerDescriptor};
use tagbridge_parser::{parse_unit, ParseError};
use thiserror::Error;
use tracing::{debug, info};

/// Failure to load one unit
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file exists but could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// Resolved path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The unit does not describe a controller
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// Resolved path
        path: PathBuf,
        /// Parser error
        #[source]
        source: ParseError,
    },

    /// No implementation could be resolved for the unit's controller
    #[error("Failed to resolve controller for {}: {source}", path.display())]
    Resolve {
        /// Resolved path
        path: PathBuf,
        /// Resolver error
        #[source]
        source: ResolveError,
    },

    /// The load task stopped before producing a result
    #[error("Load of {} aborted: {reason}", path.display())]
    Aborted {
        /// Requested path
        path: PathBuf,
        /// Why the task stopped
        reason: String,
    },
}

/// A successfully loaded unit
#[derive(Debug, Clone)]
pub struct LoadedUnit {
    /// Path the unit was read from
    pub path: PathBuf,
    /// Parsed route table of the unit
    pub descriptor: ControllerDescriptor,
    /// Implementation resolved for the unit's controller name
    pub controller: Controller,
}

/// Reads, parses and resolves units
pub struct UnitLoader<P> {
    parser: Arc<P>,
    resolver: Arc<dyn ControllerResolver>,
    suffix: String,
}

impl<P> Clone for UnitLoader<P> {
    fn clone(&self) -> Self {
        Self {
            parser: Arc::clone(&self.parser),
            resolver: Arc::clone(&self.resolver),
            suffix: self.suffix.clone(),
        }
    }
}

impl<P: CommentParser> UnitLoader<P> {
    /// Create a loader
    pub fn new(parser: P, resolver: Arc<dyn ControllerResolver>, suffix: impl Into<String>) -> Self {
        Self {
            parser: Arc::new(parser),
            resolver,
            suffix: suffix.into(),
        }
    }

    /// Suffix tried when a path does not exist as given
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub(crate) fn set_suffix(&mut self, suffix: impl Into<String>) {
        self.suffix = suffix.into();
    }

    /// Find the file for `path`: as given, then with the suffix appended
    /// unless it already ends with it
    pub async fn locate(&self, path: &Path) -> Option<PathBuf> {
        if is_file(path).await {
            return Some(path.to_path_buf());
        }
        if self.suffix.is_empty() || path.as_os_str().to_string_lossy().ends_with(&self.suffix) {
            return None;
        }
        let mut candidate = OsString::from(path.as_os_str());
        candidate.push(&self.suffix);
        let candidate = PathBuf::from(candidate);
        is_file(&candidate).await.then_some(candidate)
    }

    /// Load one unit. A path with no matching file yields `Ok(None)`.
    pub async fn load(&self, path: &Path, args: &[Value]) -> Result<Option<LoadedUnit>, LoadError> {
        let Some(path) = self.locate(path).await else {
            debug!(path = %path.display(), "No controller unit found, skipping");
            return Ok(None);
        };

        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LoadError::Read {
                path: path.clone(),
                source,
            })?;

        let descriptor = parse_unit(self.parser.as_ref(), &source).map_err(|source| {
            LoadError::Parse {
                path: path.clone(),
                source,
            }
        })?;

        let controller = self
            .resolver
            .resolve(&descriptor.name, &path, args)
            .map_err(|source| LoadError::Resolve {
                path: path.clone(),
                source,
            })?;

        info!(
            controller = %descriptor.name,
            routes = descriptor.methods.len(),
            path = %path.display(),
            "Loaded controller unit"
        );

        Ok(Some(LoadedUnit {
            path,
            descriptor,
            controller,
        }))
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
