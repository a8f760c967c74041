//! Route sinks: where finished handler chains get registered.
//!
//! [`RouteSink`] is the seam to the HTTP router. [`AxumSink`] adapts axum
//! requests into [`ApiRequest`]s and runs the chain for them.

use crate::middleware::HandlerChain;
use crate::request::{ApiRequest, ApiResponse};
use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, Uri},
    routing::{get, post, MethodRouter},
    Router as AxumRouter,
};
use serde_json::{json, Map, Value};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use tagbridge_domain::Verb;
use thiserror::Error;

/// A route the sink refused to hold
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Route paths are absolute
    #[error("Route path {0:?} must start with '/'")]
    RelativePath(String),

    /// The same verb and path were registered before
    #[error("Route {verb} {path} is already registered")]
    Duplicate {
        /// Request verb
        verb: Verb,
        /// Path pattern
        path: String,
    },

    /// A parameter segment is named differently than in an earlier route
    #[error("Route path {path} conflicts with {existing}")]
    Conflict {
        /// Rejected path pattern
        path: String,
        /// Earlier path pattern it collides with
        existing: String,
    },

    /// The HTTP router refused the path
    #[error("Route path {path} rejected: {reason}")]
    Rejected {
        /// Rejected path pattern
        path: String,
        /// Router message
        reason: String,
    },
}

/// Receives `(verb, path pattern, handler chain)` registrations in order
pub trait RouteSink {
    /// Register one route; an error leaves the sink unchanged
    fn register(&mut self, verb: Verb, path: &str, chain: HandlerChain) -> Result<(), SinkError>;
}

/// Sink building an axum [`Router`](AxumRouter).
///
/// Paths use axum's `:name` segment syntax, which is the syntax route
/// annotations are written in. Paths axum cannot hold are refused with a
/// [`SinkError`] instead of panicking: relative paths, a second
/// registration of the same verb and path, and parameter segments named
/// differently at the same position under a shared prefix.
#[derive(Default)]
pub struct AxumSink {
    router: AxumRouter,
    seen: HashSet<(Verb, String)>,
    order: Vec<(Verb, String)>,
}

impl AxumSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> &[(Verb, String)] {
        &self.order
    }

    /// Finish into an axum router
    pub fn into_router(self) -> AxumRouter {
        self.router
    }
}

impl RouteSink for AxumSink {
    fn register(&mut self, verb: Verb, path: &str, chain: HandlerChain) -> Result<(), SinkError> {
        if !path.starts_with('/') {
            return Err(SinkError::RelativePath(path.to_string()));
        }
        let key = (verb, path.to_string());
        if self.seen.contains(&key) {
            return Err(SinkError::Duplicate {
                verb,
                path: path.to_string(),
            });
        }
        if let Some((_, existing)) = self.order.iter().find(|(_, p)| param_conflict(p, path)) {
            return Err(SinkError::Conflict {
                path: path.to_string(),
                existing: existing.clone(),
            });
        }

        // axum panics on anything else it cannot insert; keep the old router then
        let candidate = self.router.clone();
        let methods = method_router(verb, chain);
        self.router = panic::catch_unwind(AssertUnwindSafe(move || candidate.route(path, methods)))
            .map_err(|payload| SinkError::Rejected {
                path: path.to_string(),
                reason: panic_message(payload.as_ref()),
            })?;
        self.seen.insert(key.clone());
        self.order.push(key);
        Ok(())
    }
}

/// Whether two paths name a parameter differently at the same position
/// after an identical prefix
fn param_conflict(existing: &str, path: &str) -> bool {
    for (a, b) in existing.split('/').zip(path.split('/')) {
        match (a.strip_prefix(':'), b.strip_prefix(':')) {
            (Some(x), Some(y)) if x != y => return true,
            _ if a == b => continue,
            _ => return false,
        }
    }
    false
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "route insertion failed".to_string()
    }
}

fn method_router(verb: Verb, chain: HandlerChain) -> MethodRouter {
    let handler = move |params: Option<Path<HashMap<String, String>>>,
                        Query(query): Query<HashMap<String, String>>,
                        headers: HeaderMap,
                        uri: Uri,
                        body: Bytes| {
        let chain = chain.clone();
        async move {
            let body = match body_fields(&body) {
                Ok(body) => body,
                Err(response) => return response,
            };
            let request = ApiRequest {
                path: uri.path().to_string(),
                headers,
                body,
                query: string_map(query),
                params: params.map(|Path(p)| string_map(p)).unwrap_or_default(),
                locals: Map::new(),
            };
            chain.run(request).await
        }
    };

    match verb {
        Verb::Get => get(handler),
        Verb::Post => post(handler),
    }
}

fn string_map(fields: HashMap<String, String>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect()
}

/// Body fields from a JSON object body; an empty body has no fields
fn body_fields(body: &[u8]) -> Result<Map<String, Value>, ApiResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(bad_request("Request body must be a JSON object")),
        Err(e) => Err(bad_request(&format!("Invalid JSON body: {}", e))),
    }
}

fn bad_request(message: &str) -> ApiResponse {
    ApiResponse::json(StatusCode::BAD_REQUEST, json!({ "message": message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{from_fn, Middleware, Next};
    use axum::{body::Body, http::Request};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Echoes the extracted request back as JSON
    fn echo_chain() -> HandlerChain {
        let echo: Arc<dyn Middleware> = Arc::new(from_fn(|request: ApiRequest, _next: Next| async move {
            ApiResponse::json(
                StatusCode::OK,
                json!({
                    "path": request.path,
                    "body": request.body,
                    "query": request.query,
                    "params": request.params,
                }),
            )
        }));
        HandlerChain::new(vec![echo])
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_body_fields() {
        assert!(body_fields(b"").unwrap().is_empty());
        assert!(body_fields(b"  \n").unwrap().is_empty());
        assert_eq!(body_fields(br#"{"a":1}"#).unwrap()["a"], json!(1));
        assert_eq!(body_fields(b"[1]").unwrap_err().status, StatusCode::BAD_REQUEST);
        assert_eq!(body_fields(b"{nope").unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_duplicate_route_keeps_first() {
        let mut sink = AxumSink::new();
        sink.register(Verb::Get, "/users", echo_chain()).unwrap();
        sink.register(Verb::Post, "/users", echo_chain()).unwrap();
        let err = sink.register(Verb::Get, "/users", echo_chain()).unwrap_err();

        assert!(matches!(err, SinkError::Duplicate { verb: Verb::Get, .. }));
        assert_eq!(
            sink.routes(),
            &[
                (Verb::Get, "/users".to_string()),
                (Verb::Post, "/users".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_axum_request_is_adapted() {
        let mut sink = AxumSink::new();
        sink.register(Verb::Post, "/users/:id", echo_chain()).unwrap();
        let app = sink.into_router();

        let request = Request::builder()
            .method("POST")
            .uri("/users/42?verbose=yes")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email":"a@example.com"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let echoed = body_json(response).await;
        assert_eq!(echoed["path"], json!("/users/42"));
        assert_eq!(echoed["params"], json!({ "id": "42" }));
        assert_eq!(echoed["query"], json!({ "verbose": "yes" }));
        assert_eq!(echoed["body"], json!({ "email": "a@example.com" }));
    }

    #[tokio::test]
    async fn test_invalid_body_is_rejected_before_chain() {
        let mut sink = AxumSink::new();
        sink.register(Verb::Post, "/users", echo_chain()).unwrap();
        let app = sink.into_router();

        let request = Request::builder()
            .method("POST")
            .uri("/users")
            .body(Body::from("not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_relative_path_is_refused() {
        let mut sink = AxumSink::new();
        let err = sink.register(Verb::Get, "users", echo_chain()).unwrap_err();

        assert_eq!(err, SinkError::RelativePath("users".to_string()));
        assert!(sink.routes().is_empty());
    }

    #[test]
    fn test_param_conflict() {
        assert!(param_conflict("/things/:id", "/things/:key"));
        assert!(param_conflict("/things/:id", "/things/:key/parts"));
        assert!(!param_conflict("/things/:id", "/things/:id/parts"));
        assert!(!param_conflict("/things/:id", "/items/:key"));
        assert!(!param_conflict("/things/:id", "/things/new"));
        assert!(!param_conflict("/a/:x", "/a"));
    }

    #[tokio::test]
    async fn test_conflicting_param_name_keeps_first() {
        let mut sink = AxumSink::new();
        sink.register(Verb::Get, "/things/:id", echo_chain()).unwrap();
        let err = sink
            .register(Verb::Post, "/things/:key", echo_chain())
            .unwrap_err();

        assert_eq!(
            err,
            SinkError::Conflict {
                path: "/things/:key".to_string(),
                existing: "/things/:id".to_string(),
            }
        );
        assert_eq!(sink.routes(), &[(Verb::Get, "/things/:id".to_string())]);

        let app = sink.into_router();
        let request = Request::builder()
            .method("GET")
            .uri("/things/7")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(body_json(response).await["params"], json!({ "id": "7" }));
    }

    #[test]
    fn test_router_panic_becomes_error() {
        let mut sink = AxumSink::new();
        sink.register(Verb::Get, "/users", echo_chain()).unwrap();
        let err = sink.register(Verb::Get, "/users/:", echo_chain()).unwrap_err();

        assert!(matches!(err, SinkError::Rejected { .. }));
        assert_eq!(sink.routes(), &[(Verb::Get, "/users".to_string())]);
    }
}
