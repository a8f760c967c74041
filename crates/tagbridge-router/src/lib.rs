//! Tagbridge Router
//!
//! Binds annotated controller units to request handlers.
//!
//! # Overview
//!
//! A [`Bridge`] owns everything accumulated for one application: the
//! [`Registry`] of loaded controllers, the [`MiddlewareIndex`] and the
//! [`CompletionGate`] over queued loads. Loading and middleware registration
//! happen at startup; routes are handed to a [`RouteSink`] once every queued
//! load has settled. Adding middleware or loading units while serving is not
//! supported.
//!
//! # Example Usage
//!
//! ```no_run
//! use serde_json::json;
//! use tagbridge_router::{Bridge, Controller, StaticResolver};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = StaticResolver::new().controller(
//!     "Users",
//!     Controller::new().sync_method("list", |_| Ok(json!([]))),
//! );
//!
//! let mut bridge = Bridge::new(resolver);
//! bridge.include(["controllers/users"]).await?;
//! let app = bridge.router()?.await?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod gate;
pub mod loader;
pub mod middleware;
pub mod registry;
pub mod request;
pub mod sink;

pub use config::{BridgeConfig, ConfigError, ErrorFilter, ErrorPolicy};
pub use controller::{
    invoke, Controller, ControllerError, ControllerMethod, ControllerResolver, ResolveError,
    StaticResolver,
};
pub use gate::CompletionGate;
pub use loader::{LoadError, LoadedUnit};
pub use middleware::{from_fn, HandlerChain, Middleware, MiddlewareIndex, Next, GLOBAL_KEY};
pub use registry::Registry;
pub use request::{ApiRequest, ApiResponse, ResponseBody};
pub use sink::{AxumSink, RouteSink, SinkError};

use dispatch::RouteHandler;
use futures::future::join_all;
use gate::PendingUnit;
use loader::UnitLoader;
use serde_json::Value;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tagbridge_domain::{CommentParser, ControllerDescriptor};
use tagbridge_parser::DocCommentParser;
use tracing::{debug, error, info, warn};

/// Bridge error
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Routes were requested before any unit was included
    #[error("No controller units included; call include() before registering routes")]
    NothingIncluded,

    /// A queued unit failed to load
    #[error("{0}")]
    Load(Arc<LoadError>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Outcome of one `include` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Units loaded and registered
    pub loaded: usize,
    /// Paths with no matching file
    pub skipped: usize,
}

/// Owned aggregate of loaded controllers, middleware and pending loads
pub struct Bridge<P = DocCommentParser> {
    loader: UnitLoader<P>,
    policy: ErrorPolicy,
    middleware: MiddlewareIndex,
    gate: CompletionGate,
    registry: Registry,
    replayed: usize,
    failures: Vec<Arc<LoadError>>,
}

impl Bridge<DocCommentParser> {
    /// Create a bridge reading Rust doc comments
    pub fn new<R>(resolver: R) -> Self
    where
        R: ControllerResolver + 'static,
    {
        Self::with_parser(DocCommentParser::new(), resolver)
    }
}

impl<P> Bridge<P>
where
    P: CommentParser + 'static,
{
    /// Create a bridge using a custom comment extractor
    pub fn with_parser<R>(parser: P, resolver: R) -> Self
    where
        R: ControllerResolver + 'static,
    {
        let config = BridgeConfig::default();
        Self {
            loader: UnitLoader::new(parser, Arc::new(resolver), config.source_suffix),
            policy: ErrorPolicy::new(config.error_status_property),
            middleware: MiddlewareIndex::new(),
            gate: CompletionGate::new(),
            registry: Registry::new(),
            replayed: 0,
            failures: Vec::new(),
        }
    }

    /// Apply loaded configuration
    pub fn with_config(mut self, config: &BridgeConfig) -> Self {
        self.loader.set_suffix(config.source_suffix.clone());
        self.policy.status_property = config.error_status_property.clone();
        self
    }

    /// Apply configuration read from a TOML file
    pub fn with_config_file<Q: AsRef<Path>>(self, path: Q) -> Result<Self, BridgeError> {
        let config = BridgeConfig::from_file(path)?;
        Ok(self.with_config(&config))
    }

    /// Filter applied to failures before they are sent to clients
    pub fn with_error_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&ControllerError) -> Value + Send + Sync + 'static,
    {
        self.policy.filter = Arc::new(filter);
        self
    }

    /// Current failure reporting policy
    pub fn error_policy(&self) -> &ErrorPolicy {
        &self.policy
    }

    /// Add middleware under a dotted key: `""` global, `"Users"` group,
    /// `"Users.create"` one route
    pub fn add<M>(&mut self, key: &str, handler: M) -> &mut Self
    where
        M: Middleware + 'static,
    {
        self.middleware.add(key, Arc::new(handler));
        self
    }

    /// Add middleware that runs for every route
    pub fn add_global<M>(&mut self, handler: M) -> &mut Self
    where
        M: Middleware + 'static,
    {
        self.add(GLOBAL_KEY, handler)
    }

    /// Add several handlers under one key, keeping their order
    pub fn add_many<I>(&mut self, key: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        self.middleware.extend(key, handlers);
        self
    }

    /// Queue controller units for loading.
    ///
    /// Loading starts immediately on the Tokio runtime; the returned future
    /// resolves once every given path has settled and reports the first
    /// failure among them. Routes are registered in the order units are
    /// queued across all calls.
    pub fn include<I, T>(
        &mut self,
        paths: I,
    ) -> impl Future<Output = Result<LoadSummary, BridgeError>> + Send + 'static
    where
        I: IntoIterator<Item = T>,
        T: AsRef<Path>,
    {
        self.include_with_args(paths, Vec::new())
    }

    /// Queue controller units, handing `args` to each controller factory
    pub fn include_with_args<I, T>(
        &mut self,
        paths: I,
        args: Vec<Value>,
    ) -> impl Future<Output = Result<LoadSummary, BridgeError>> + Send + 'static
    where
        I: IntoIterator<Item = T>,
        T: AsRef<Path>,
    {
        self.gate.request();
        let args: Arc<[Value]> = args.into();

        let pending: Vec<PendingUnit> = paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref().to_path_buf();
                let loader = self.loader.clone();
                let args = Arc::clone(&args);
                let requested = path.clone();
                self.gate
                    .enqueue(path, async move { loader.load(&requested, &args).await })
            })
            .collect();

        async move {
            let mut summary = LoadSummary::default();
            for outcome in join_all(pending).await {
                match outcome.map_err(BridgeError::Load)? {
                    Some(_) => summary.loaded += 1,
                    None => summary.skipped += 1,
                }
            }
            Ok(summary)
        }
    }

    /// Wait for every queued unit and merge newly settled ones into the
    /// registry in submission order
    async fn settle(&mut self) -> Result<(), BridgeError> {
        let outcomes = self.gate.settled_from(self.replayed).await;
        for outcome in outcomes {
            self.replayed += 1;
            match outcome {
                Ok(Some(unit)) => self.registry.register(unit.descriptor, unit.controller),
                Ok(None) => {}
                Err(err) => {
                    error!(error = %err, "Controller unit failed to load");
                    self.failures.push(err);
                }
            }
        }

        match self.failures.first() {
            Some(err) => Err(BridgeError::Load(Arc::clone(err))),
            None => Ok(()),
        }
    }

    /// Route table of every loaded unit, once all queued loads have settled
    pub async fn mapping(&mut self) -> Result<&[ControllerDescriptor], BridgeError> {
        self.settle().await?;
        Ok(self.registry.descriptors())
    }

    /// Live controllers for direct calls, once all queued loads have settled
    pub async fn api(&mut self) -> Result<&Registry, BridgeError> {
        self.settle().await?;
        Ok(&self.registry)
    }

    /// Register every route with `sink`.
    ///
    /// Fails immediately if nothing was ever included. Otherwise the
    /// returned future waits for the gate, then registers routes in
    /// submission order and yields how many were registered. A route the
    /// sink refuses is skipped with a warning. Nothing is registered if any
    /// unit failed to load.
    pub fn mount<'a, S>(
        &'a mut self,
        sink: &'a mut S,
    ) -> Result<impl Future<Output = Result<usize, BridgeError>> + 'a, BridgeError>
    where
        S: RouteSink,
    {
        if !self.gate.was_requested() {
            return Err(BridgeError::NothingIncluded);
        }
        Ok(self.register_routes(sink))
    }

    /// Build an axum router holding every route.
    ///
    /// Same contract as [`mount`](Self::mount).
    pub fn router(
        &mut self,
    ) -> Result<impl Future<Output = Result<axum::Router, BridgeError>> + '_, BridgeError> {
        if !self.gate.was_requested() {
            return Err(BridgeError::NothingIncluded);
        }
        Ok(async move {
            let mut sink = AxumSink::new();
            self.register_routes(&mut sink).await?;
            Ok(sink.into_router())
        })
    }

    async fn register_routes<S: RouteSink>(&mut self, sink: &mut S) -> Result<usize, BridgeError> {
        self.settle().await?;

        let mut count = 0;
        for descriptor in self.registry.descriptors() {
            let implementation = self.registry.controller(&descriptor.name);
            for route in &descriptor.methods {
                let method = implementation.and_then(|c| c.get(&route.name)).cloned();
                let mut handlers = self.middleware.chain_for(&descriptor.name, &route.name);
                handlers.push(Arc::new(RouteHandler::new(
                    descriptor.name.clone(),
                    route.clone(),
                    method,
                    self.policy.clone(),
                )));

                debug!(
                    "{} {} => {}.{} ({})",
                    route.verb.as_str().to_uppercase(),
                    route.path,
                    descriptor.name,
                    route.name,
                    route.signature()
                );
                match sink.register(route.verb, &route.path, HandlerChain::new(handlers)) {
                    Ok(()) => count += 1,
                    Err(e) => warn!(
                        controller = %descriptor.name,
                        method = %route.name,
                        "Skipping route: {}",
                        e
                    ),
                }
            }
        }

        info!(routes = count, controllers = self.registry.len(), "Routes registered");
        Ok(count)
    }
}

impl<P> std::fmt::Debug for Bridge<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("policy", &self.policy)
            .field("gate", &self.gate)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
