//! Terminal route handlers.
//!
//! One [`RouteHandler`] per route: extract arguments by declared source,
//! invoke the implementation, then serialize by declared return type or
//! translate the failure into a status and filtered body.

use crate::config::ErrorPolicy;
use crate::controller::{invoke, ControllerError, ControllerMethod};
use crate::middleware::{Middleware, Next};
use crate::request::{ApiRequest, ApiResponse};
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;
use tagbridge_domain::RouteDescriptor;
use tracing::error;

/// Positional arguments for `route`, one per declared parameter
pub fn extract_args(route: &RouteDescriptor, request: &ApiRequest) -> Vec<Value> {
    route
        .params
        .iter()
        .map(|param| request.field(param.source, &param.name))
        .collect()
}

/// Encode a successful result: `Object`/`Array` as JSON, anything else raw
pub fn success_response(route: &RouteDescriptor, value: Value) -> ApiResponse {
    if route.returns.is_structured() {
        ApiResponse::json(StatusCode::OK, value)
    } else {
        ApiResponse::raw(StatusCode::OK, value)
    }
}

/// Encode a failure under `policy`
pub fn failure_response(policy: &ErrorPolicy, err: &ControllerError) -> ApiResponse {
    let status = err.status_code(&policy.status_property);
    ApiResponse::json(status, (policy.filter)(err))
}

/// Last handler of a route's chain
pub struct RouteHandler {
    controller: String,
    route: RouteDescriptor,
    method: Option<ControllerMethod>,
    policy: ErrorPolicy,
}

impl RouteHandler {
    /// Bind `route` of `controller` to its implementation.
    ///
    /// A missing implementation is reported per request as a 500.
    pub fn new(
        controller: impl Into<String>,
        route: RouteDescriptor,
        method: Option<ControllerMethod>,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            controller: controller.into(),
            route,
            method,
            policy,
        }
    }

    /// Run the route without a chain
    pub async fn dispatch(&self, request: ApiRequest) -> ApiResponse {
        let args = extract_args(&self.route, &request);
        let outcome = match &self.method {
            Some(method) => invoke(method, args).await,
            None => Err(ControllerError::new(format!(
                "Controller {} has no method {}",
                self.controller, self.route.name
            ))),
        };

        match outcome {
            Ok(value) => success_response(&self.route, value),
            Err(err) => {
                let response = failure_response(&self.policy, &err);
                error!(
                    controller = %self.controller,
                    method = %self.route.name,
                    status = response.status.as_u16(),
                    trace = err.trace().unwrap_or("<none>"),
                    details = %err.to_value(),
                    "Controller method failed: {}",
                    err
                );
                response
            }
        }
    }
}

#[async_trait]
impl Middleware for RouteHandler {
    async fn handle(&self, request: ApiRequest, _next: Next) -> ApiResponse {
        self.dispatch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResponseBody;
    use serde_json::json;
    use std::sync::Arc;
    use tagbridge_domain::{ParamDescriptor, ParamSource, ReturnDescriptor, Verb};

    fn route(returns: &str) -> RouteDescriptor {
        RouteDescriptor {
            name: "update".to_string(),
            description: String::new(),
            verb: Verb::Post,
            path: "/users/:id".to_string(),
            params: vec![
                ParamDescriptor::new("id", ParamSource::Path),
                ParamDescriptor::new("email", ParamSource::Body),
                ParamDescriptor::new("verbose", ParamSource::Query),
                ParamDescriptor::new("user", ParamSource::Local),
                ParamDescriptor::new("nickname", ParamSource::Body),
            ],
            returns: ReturnDescriptor {
                type_name: returns.to_string(),
                description: String::new(),
            },
        }
    }

    fn request() -> ApiRequest {
        ApiRequest::new("/users/7")
            .with_param("id", "7")
            .with_body_field("email", "a@example.com")
            .with_body_field("id", "spoofed")
            .with_query("verbose", "1")
            .with_local("user", json!({ "name": "alice" }))
    }

    fn echo() -> Option<ControllerMethod> {
        Some(ControllerMethod::sync(|args| Ok(Value::Array(args))))
    }

    #[test]
    fn test_extract_args_by_source() {
        let args = extract_args(&route("Object"), &request());
        assert_eq!(
            args,
            vec![
                json!("7"),
                json!("a@example.com"),
                json!("1"),
                json!({ "name": "alice" }),
                Value::Null,
            ]
        );
    }

    #[tokio::test]
    async fn test_structured_result() {
        let handler = RouteHandler::new("Users", route("Array"), echo(), ErrorPolicy::default());
        let response = handler.dispatch(request()).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json_body().unwrap()[0], json!("7"));
    }

    #[tokio::test]
    async fn test_raw_result() {
        let method = Some(ControllerMethod::sync(|_| Ok(json!("done"))));
        let handler = RouteHandler::new("Users", route("String"), method, ErrorPolicy::default());
        let response = handler.dispatch(request()).await;
        assert_eq!(response.body, ResponseBody::Raw("done".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_type_is_raw() {
        let method = Some(ControllerMethod::sync(|_| Ok(json!({ "a": 1 }))));
        let handler = RouteHandler::new("Users", route("User"), method, ErrorPolicy::default());
        let response = handler.dispatch(request()).await;
        assert_eq!(response.body, ResponseBody::Raw(r#"{"a":1}"#.to_string()));
    }

    #[tokio::test]
    async fn test_failure_with_status_property() {
        let method = Some(ControllerMethod::new(|_| async {
            Err(ControllerError::new("missing").with_status(404))
        }));
        let handler = RouteHandler::new("Users", route("Object"), method, ErrorPolicy::default());
        let response = handler.dispatch(request()).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(
            response.body,
            ResponseBody::Json(json!({ "message": "missing", "httpCode": 404 }))
        );
    }

    #[tokio::test]
    async fn test_failure_without_status_is_500() {
        let method = Some(ControllerMethod::sync(|_| Err(ControllerError::new("broken"))));
        let handler = RouteHandler::new("Users", route("Object"), method, ErrorPolicy::default());
        let response = handler.dispatch(request()).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_custom_status_property_and_filter() {
        let policy = ErrorPolicy {
            status_property: "status".to_string(),
            filter: Arc::new(|err: &ControllerError| json!({ "error": err.message() })),
        };
        let method = Some(ControllerMethod::sync(|_| {
            Err(ControllerError::new("taken")
                .with_property("status", 409)
                .with_status(418)
                .with_trace("users.rs:42"))
        }));
        let handler = RouteHandler::new("Users", route("Object"), method, policy);
        let response = handler.dispatch(request()).await;
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.body, ResponseBody::Json(json!({ "error": "taken" })));
    }

    #[tokio::test]
    async fn test_missing_implementation() {
        let handler = RouteHandler::new("Users", route("Object"), None, ErrorPolicy::default());
        let response = handler.dispatch(request()).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json_body().unwrap()["message"],
            "Controller Users has no method update"
        );
    }

    #[tokio::test]
    async fn test_panicking_method_is_recovered() {
        let method = Some(ControllerMethod::sync(|_| panic!("kaboom")));
        let handler = RouteHandler::new("Users", route("Object"), method, ErrorPolicy::default());
        let response = handler.dispatch(request()).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
