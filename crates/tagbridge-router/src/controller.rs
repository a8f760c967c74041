//! Controller implementations and the call normalization adapter.
//!
//! A [`Controller`] is a plain mapping from method name to callable. Callables
//! take their arguments positionally as JSON values. Whether a method is
//! synchronous or asynchronous, and whether it returns an error or panics,
//! [`invoke`] always yields one `Result`.

use axum::http::StatusCode;
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Property read for the HTTP status when none is configured
pub const DEFAULT_STATUS_PROPERTY: &str = "httpCode";

/// Future returned by a controller method
pub type MethodFuture = BoxFuture<'static, Result<Value, ControllerError>>;

/// Failure value produced by a controller method.
///
/// Carries a message, free-form properties (e.g. `httpCode`) and an optional
/// trace that is logged server-side but never sent unless a filter adds it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ControllerError {
    message: String,
    properties: Map<String, Value>,
    trace: Option<String>,
}

impl ControllerError {
    /// Create an error with a message and no properties
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            properties: Map::new(),
            trace: None,
        }
    }

    /// Set the `httpCode` property
    pub fn with_status(self, status: u16) -> Self {
        self.with_property(DEFAULT_STATUS_PROPERTY, status)
    }

    /// Set an arbitrary property
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Attach a trace for server-side logging
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Look up a property
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Trace, if any
    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    /// HTTP status read from `property`; 500 unless it holds a valid status
    /// number. Whole floats (`404.0`) count.
    pub fn status_code(&self, property: &str) -> StatusCode {
        self.property(property)
            .and_then(|value| {
                value.as_u64().or_else(|| {
                    value
                        .as_f64()
                        .filter(|code| code.fract() == 0.0)
                        .filter(|code| (0.0..=f64::from(u16::MAX)).contains(code))
                        .map(|code| code as u64)
                })
            })
            .and_then(|code| u16::try_from(code).ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// JSON form: the properties plus `message`. The trace is not included.
    pub fn to_value(&self) -> Value {
        let mut object = self.properties.clone();
        object.insert("message".to_string(), Value::String(self.message.clone()));
        Value::Object(object)
    }

    fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::new(format!("Controller method panicked: {}", detail))
    }
}

/// A callable controller method
#[derive(Clone)]
pub struct ControllerMethod(Arc<dyn Fn(Vec<Value>) -> MethodFuture + Send + Sync>);

impl ControllerMethod {
    /// Wrap an asynchronous callable
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ControllerError>> + Send + 'static,
    {
        Self(Arc::new(move |args| f(args).boxed()))
    }

    /// Wrap a synchronous callable
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, ControllerError> + Send + Sync + 'static,
    {
        Self(Arc::new(move |args| future::ready(f(args)).boxed()))
    }

    fn call(&self, args: Vec<Value>) -> MethodFuture {
        (self.0)(args)
    }
}

impl std::fmt::Debug for ControllerMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ControllerMethod")
    }
}

/// Invoke a method, folding sync return, sync panic, async value, async
/// error and async panic into one outcome
pub async fn invoke(method: &ControllerMethod, args: Vec<Value>) -> Result<Value, ControllerError> {
    let pending = match panic::catch_unwind(AssertUnwindSafe(|| method.call(args))) {
        Ok(pending) => pending,
        Err(payload) => return Err(ControllerError::from_panic(payload)),
    };
    match AssertUnwindSafe(pending).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(ControllerError::from_panic(payload)),
    }
}

/// Live implementation object: method name → callable
#[derive(Debug, Clone, Default)]
pub struct Controller {
    methods: BTreeMap<String, ControllerMethod>,
}

impl Controller {
    /// Create a controller with no methods
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asynchronous method
    pub fn method<F, Fut>(self, name: &str, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ControllerError>> + Send + 'static,
    {
        self.with(name, ControllerMethod::new(f))
    }

    /// Add a synchronous method
    pub fn sync_method<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, ControllerError> + Send + Sync + 'static,
    {
        self.with(name, ControllerMethod::sync(f))
    }

    /// Add a prepared method
    pub fn with(mut self, name: &str, method: ControllerMethod) -> Self {
        self.methods.insert(name.to_string(), method);
        self
    }

    /// Look up a method
    pub fn get(&self, name: &str) -> Option<&ControllerMethod> {
        self.methods.get(name)
    }

    /// Method names in sorted order
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Number of methods
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the controller has no methods
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Merge `other` into this controller; `other` wins per method name
    pub fn merge(&mut self, other: Controller) {
        self.methods.extend(other.methods);
    }

    /// Call a method by name through [`invoke`]
    pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, ControllerError> {
        match self.get(name) {
            Some(method) => invoke(method, args).await,
            None => Err(ControllerError::new(format!("No such method: {}", name)).with_status(404)),
        }
    }
}

/// Resolver error
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Nothing is registered under the controller name
    #[error("No implementation registered for controller {0}")]
    Unknown(String),

    /// The implementation could not be instantiated
    #[error("Failed to instantiate controller {name}: {reason}")]
    Factory {
        /// Controller name
        name: String,
        /// Failure description
        reason: String,
    },
}

/// Resolves a controller implementation for a parsed source unit.
///
/// `args` are the caller-supplied constructor arguments of the load call.
pub trait ControllerResolver: Send + Sync {
    /// Produce the implementation for controller `name` declared in `source`
    fn resolve(&self, name: &str, source: &Path, args: &[Value]) -> Result<Controller, ResolveError>;
}

type Factory = Arc<dyn Fn(&[Value]) -> Result<Controller, ResolveError> + Send + Sync>;

/// Resolver over a fixed table of controller factories
#[derive(Clone, Default)]
pub struct StaticResolver {
    factories: BTreeMap<String, Factory>,
}

impl StaticResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ready-made controller; each resolution hands out a clone
    pub fn controller(self, name: &str, controller: Controller) -> Self {
        self.factory(name, move |_| controller.clone())
    }

    /// Register a factory called with the load call's constructor arguments
    pub fn factory<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Controller + Send + Sync + 'static,
    {
        self.try_factory(name, move |args| Ok(f(args)))
    }

    /// Register a fallible factory
    pub fn try_factory<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Controller, ResolveError> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(f));
        self
    }
}

impl ControllerResolver for StaticResolver {
    fn resolve(&self, name: &str, _source: &Path, args: &[Value]) -> Result<Controller, ResolveError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ResolveError::Unknown(name.to_string()))?;
        factory(args)
    }
}
