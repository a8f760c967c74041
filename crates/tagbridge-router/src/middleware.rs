//! Middleware and the dotted-key middleware index.
//!
//! Keys form three tiers: `""` (global), `Controller` (group) and
//! `Controller.method` (specific). A route's chain is always global, then
//! group, then specific, then the route's own terminal handler.

use crate::request::{ApiRequest, ApiResponse};
use async_trait::async_trait;
use axum::http::StatusCode;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::trace;

/// Key of the global middleware tier
pub const GLOBAL_KEY: &str = "";

/// Continuation of the chain after the current handler
pub type Next = Box<dyn FnOnce(ApiRequest) -> BoxFuture<'static, ApiResponse> + Send>;

/// A request handler that may answer directly or pass on to `next`
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Handle the request
    async fn handle(&self, request: ApiRequest, next: Next) -> ApiResponse;
}

/// Middleware built from an async closure
pub struct FnMiddleware<F> {
    f: F,
}

/// Wrap `f` as a [`Middleware`]
pub fn from_fn<F, Fut>(f: F) -> FnMiddleware<F>
where
    F: Fn(ApiRequest, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResponse> + Send + 'static,
{
    FnMiddleware { f }
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(ApiRequest, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResponse> + Send + 'static,
{
    async fn handle(&self, request: ApiRequest, next: Next) -> ApiResponse {
        (self.f)(request, next).await
    }
}

/// An ordered, shareable handler chain
#[derive(Clone)]
pub struct HandlerChain {
    handlers: Arc<[Arc<dyn Middleware>]>,
}

impl HandlerChain {
    /// Create a chain; handlers run in the given order
    pub fn new(handlers: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            handlers: handlers.into(),
        }
    }

    /// Number of handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the chain. A chain that falls through answers 404.
    pub fn run(&self, request: ApiRequest) -> BoxFuture<'static, ApiResponse> {
        self.clone().run_from(0, request)
    }

    fn run_from(self, index: usize, request: ApiRequest) -> BoxFuture<'static, ApiResponse> {
        let Some(handler) = self.handlers.get(index).cloned() else {
            trace!(path = %request.path, "Handler chain fell through");
            return futures::future::ready(ApiResponse::status(StatusCode::NOT_FOUND)).boxed();
        };
        async move {
            let next: Next = Box::new(move |request| self.run_from(index + 1, request));
            handler.handle(request, next).await
        }
        .boxed()
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain")
            .field("len", &self.handlers.len())
            .finish()
    }
}

/// Middleware registered per dotted key; insertion order is kept per key
#[derive(Clone, Default)]
pub struct MiddlewareIndex {
    entries: HashMap<String, Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one handler under `key`
    pub fn add(&mut self, key: &str, handler: Arc<dyn Middleware>) {
        self.entries.entry(key.to_string()).or_default().push(handler);
    }

    /// Append several handlers under `key`, keeping their order
    pub fn extend<I>(&mut self, key: &str, handlers: I)
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        self.entries
            .entry(key.to_string())
            .or_default()
            .extend(handlers);
    }

    /// Handlers registered under exactly `key`
    pub fn get(&self, key: &str) -> &[Arc<dyn Middleware>] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Global, group and specific handlers for `controller.method`, in that order
    pub fn chain_for(&self, controller: &str, method: &str) -> Vec<Arc<dyn Middleware>> {
        let specific = format!("{}.{}", controller, method);
        [GLOBAL_KEY, controller, specific.as_str()]
            .iter()
            .flat_map(|key| self.get(key).iter().cloned())
            .collect()
    }

    /// Total number of registered handlers
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
