//! Request and response values passed through handler chains.
//!
//! The HTTP layer fills an [`ApiRequest`] before the chain runs and turns
//! the resulting [`ApiResponse`] back into a wire response.

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use tagbridge_domain::ParamSource;

/// A request as seen by middleware and controller dispatch
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    /// Request path as received
    pub path: String,

    /// Request headers
    pub headers: HeaderMap,

    /// Body fields
    pub body: Map<String, Value>,

    /// Query string fields
    pub query: Map<String, Value>,

    /// Named path segments
    pub params: Map<String, Value>,

    /// Properties attached by middleware (authenticated caller, ...)
    pub locals: Map<String, Value>,
}

impl ApiRequest {
    /// Create an empty request for `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set a body field
    pub fn with_body_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.body.insert(name.to_string(), value.into());
        self
    }

    /// Set a query field
    pub fn with_query(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.query.insert(name.to_string(), value.into());
        self
    }

    /// Set a path segment value
    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Set a request-local property
    pub fn with_local(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_local(name, value);
        self
    }

    /// Attach a request-local property; middleware uses this to hand values
    /// to `_name` parameters
    pub fn set_local(&mut self, name: &str, value: impl Into<Value>) {
        self.locals.insert(name.to_string(), value.into());
    }

    /// Read a field from the map selected by `source`.
    /// Absent fields read as `null`.
    pub fn field(&self, source: ParamSource, name: &str) -> Value {
        let map = match source {
            ParamSource::Body => &self.body,
            ParamSource::Query => &self.query,
            ParamSource::Path => &self.params,
            ParamSource::Local => &self.locals,
        };
        map.get(name).cloned().unwrap_or(Value::Null)
    }
}

/// Response payload
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Structured JSON encoding
    Json(Value),
    /// Unencoded text
    Raw(String),
    /// No body
    Empty,
}

/// A response produced by a handler chain
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Payload
    pub body: ResponseBody,
}

impl ApiResponse {
    /// JSON response with the given status
    pub fn json(status: StatusCode, value: Value) -> Self {
        Self {
            status,
            body: ResponseBody::Json(value),
        }
    }

    /// Raw send of a value: strings as-is, `null` as empty, anything else
    /// in its compact text form
    pub fn raw(status: StatusCode, value: Value) -> Self {
        let body = match value {
            Value::Null => ResponseBody::Empty,
            Value::String(s) => ResponseBody::Raw(s),
            other => ResponseBody::Raw(other.to_string()),
        };
        Self { status, body }
    }

    /// Bodiless response
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: ResponseBody::Empty,
        }
    }

    /// JSON body if this is a JSON response
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        match self.body {
            ResponseBody::Json(value) => (self.status, Json(value)).into_response(),
            ResponseBody::Raw(text) => (
                self.status,
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                )],
                text,
            )
                .into_response(),
            ResponseBody::Empty => self.status.into_response(),
        }
    }
}
