//! Route module - descriptors for HTTP-invocable methods

use serde::Serialize;
use std::fmt;

/// HTTP verb a route is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// GET request; non-path parameters come from the query string
    Get,

    /// POST request; non-path parameters come from the body
    Post,
}

impl Verb {
    /// Get the verb name as a lower-case string
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
        }
    }

    /// Parse a verb, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "get" => Some(Verb::Get),
            "post" => Some(Verb::Post),
            _ => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid verb: {}", s))
    }
}

/// Where a parameter value is read from at request time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSource {
    /// Named segment of the route path (`/users/:id`)
    Path,

    /// Query string field
    Query,

    /// Request body field
    Body,

    /// Property attached to the request by upstream middleware.
    /// Never client-supplied.
    Local,
}

impl ParamSource {
    /// Get the source name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamSource::Path => "path",
            ParamSource::Query => "query",
            ParamSource::Body => "body",
            ParamSource::Local => "local",
        }
    }
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDescriptor {
    /// Identifier with `[...]` and leading `_` markers removed
    pub name: String,

    /// Extraction source
    pub source: ParamSource,

    /// Declared with `[name]`
    pub optional: bool,

    /// Free-form description from the tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared types, informational only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

impl ParamDescriptor {
    /// Create a required parameter with no description
    pub fn new(name: impl Into<String>, source: ParamSource) -> Self {
        Self {
            name: name.into(),
            source,
            optional: false,
            description: None,
            types: Vec::new(),
        }
    }

    /// Whether clients may supply this parameter
    pub fn is_public(&self) -> bool {
        self.source != ParamSource::Local
    }
}

/// Declared return shape. `type_name` selects the serialization policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnDescriptor {
    /// Declared type, e.g. `Object`, `Array`, `String`
    pub type_name: String,

    /// Free-form description
    pub description: String,
}

impl ReturnDescriptor {
    /// Whether results are sent as structured JSON rather than raw
    pub fn is_structured(&self) -> bool {
        matches!(self.type_name.as_str(), "Object" | "Array")
    }
}

/// One HTTP-invocable method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDescriptor {
    /// Method name on the controller implementation
    pub name: String,

    /// Description of the documented method
    pub description: String,

    /// HTTP verb
    pub verb: Verb,

    /// Router path pattern, stored verbatim (`/users/:id`)
    pub path: String,

    /// Parameters in documentation order
    pub params: Vec<ParamDescriptor>,

    /// Return shape
    pub returns: ReturnDescriptor,
}

impl RouteDescriptor {
    /// Compact `source:name` list, e.g. `path:id, body:email`
    pub fn signature(&self) -> String {
        self.params
            .iter()
            .map(|p| format!("{}:{}", p.source, p.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
