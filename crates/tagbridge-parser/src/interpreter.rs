//! Tag interpreter: one documentation record in, one route (or a rejection) out

use crate::classifier::classify_param;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tagbridge_domain::tag::{PARAM_TAG, RETURNS_TAG, ROUTE_TAG};
use tagbridge_domain::{DocRecord, ReturnDescriptor, RouteDescriptor, TagRecord, Verb};

static ROUTE_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(post|get)\s+(.+)$").expect("route grammar should be valid")
});

static RETURNS_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\{(.+?)\}\s*(.*)$").expect("returns grammar should be valid")
});

/// Outcome of interpreting one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// The record declares a route
    Route(RouteDescriptor),
    /// The record is not routable; excluded silently
    NotRoutable(Rejection),
}

impl Interpretation {
    /// Take the route, discarding the rejection reason
    pub fn into_route(self) -> Option<RouteDescriptor> {
        match self {
            Interpretation::Route(route) => Some(route),
            Interpretation::NotRoutable(_) => None,
        }
    }
}

/// Why a record was not turned into a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No `@apiRoute` tag
    MissingRouteTag,
    /// No `@apiReturns` tag
    MissingReturnsTag,
    /// `@apiRoute` payload is not `(get|post) <path>`
    MalformedRoute(String),
    /// `@apiReturns` payload is not `{Type} description`
    MalformedReturns(String),
    /// The record documents no named item
    MissingContext,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingRouteTag => write!(f, "no @{} tag", ROUTE_TAG),
            Rejection::MissingReturnsTag => write!(f, "no @{} tag", RETURNS_TAG),
            Rejection::MalformedRoute(s) => write!(f, "malformed @{}: {:?}", ROUTE_TAG, s),
            Rejection::MalformedReturns(s) => write!(f, "malformed @{}: {:?}", RETURNS_TAG, s),
            Rejection::MissingContext => write!(f, "record has no context name"),
        }
    }
}

/// Parse an `@apiRoute` payload into verb and verbatim path
pub fn parse_route(payload: &str) -> Option<(Verb, String)> {
    let caps = ROUTE_GRAMMAR.captures(payload)?;
    let verb = Verb::parse(&caps[1])?;
    Some((verb, caps[2].to_string()))
}

/// Parse an `@apiReturns` payload into a return descriptor
pub fn parse_returns(payload: &str) -> Option<ReturnDescriptor> {
    let caps = RETURNS_GRAMMAR.captures(payload)?;
    Some(ReturnDescriptor {
        type_name: caps[1].to_string(),
        description: caps[2].to_string(),
    })
}

/// Interpret one documentation record.
///
/// Requires both a route tag and a returns tag, each matching its grammar,
/// and a context name for the method.
pub fn interpret(record: &DocRecord) -> Interpretation {
    use Interpretation::NotRoutable;

    let Some(route_tag) = record.first_tag(ROUTE_TAG) else {
        return NotRoutable(Rejection::MissingRouteTag);
    };
    let Some(returns_tag) = record.first_tag(RETURNS_TAG) else {
        return NotRoutable(Rejection::MissingReturnsTag);
    };
    let Some((verb, path)) = parse_route(&route_tag.string) else {
        return NotRoutable(Rejection::MalformedRoute(route_tag.string.clone()));
    };
    let Some(returns) = parse_returns(&returns_tag.string) else {
        return NotRoutable(Rejection::MalformedReturns(returns_tag.string.clone()));
    };
    let Some(name) = record.context.clone() else {
        return NotRoutable(Rejection::MissingContext);
    };

    let params = record
        .tags_named(PARAM_TAG)
        .iter()
        .map(|tag| {
            let mut param = classify_param(&raw_param_name(tag), verb, &path);
            param.description = tag.description.clone();
            param.types = tag.types.clone();
            param
        })
        .collect();

    Interpretation::Route(RouteDescriptor {
        name,
        description: record.description.clone(),
        verb,
        path,
        params,
        returns,
    })
}

/// Parsed name sub-field, or the first word of the raw payload
fn raw_param_name(tag: &TagRecord) -> String {
    match &tag.name {
        Some(name) => name.clone(),
        None => tag
            .string
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagbridge_domain::ParamSource;

    fn routable(route: &str, returns: &str) -> DocRecord {
        DocRecord::new("Create a user", Some("create"))
            .with_tag(TagRecord::new(ROUTE_TAG, route))
            .with_tag(TagRecord::new(RETURNS_TAG, returns))
    }

    #[test]
    fn test_parse_route_post() {
        assert_eq!(
            parse_route("post /users/:id"),
            Some((Verb::Post, "/users/:id".to_string()))
        );
    }

    #[test]
    fn test_parse_route_uppercase_verb() {
        assert_eq!(parse_route("GET /items"), Some((Verb::Get, "/items".to_string())));
        assert_eq!(parse_route("  Get   /items"), Some((Verb::Get, "/items".to_string())));
    }

    #[test]
    fn test_parse_route_rejects() {
        assert_eq!(parse_route("put /items"), None);
        assert_eq!(parse_route("get"), None);
        assert_eq!(parse_route("get/items"), None);
        assert_eq!(parse_route(""), None);
    }

    #[test]
    fn test_parse_returns() {
        let ret = parse_returns("{Object} the created user").unwrap();
        assert_eq!(ret.type_name, "Object");
        assert_eq!(ret.description, "the created user");
    }

    #[test]
    fn test_parse_returns_non_greedy() {
        let ret = parse_returns("{Array} list of {id} records").unwrap();
        assert_eq!(ret.type_name, "Array");
        assert_eq!(ret.description, "list of {id} records");
    }

    #[test]
    fn test_parse_returns_without_description() {
        let ret = parse_returns("{String}").unwrap();
        assert_eq!(ret.type_name, "String");
        assert_eq!(ret.description, "");
    }

    #[test]
    fn test_parse_returns_rejects() {
        assert_eq!(parse_returns("Object the user"), None);
        assert_eq!(parse_returns("{} nothing"), None);
    }

    #[test]
    fn test_interpret_route() {
        let record = routable("post /users/:id", "{Object} the created user")
            .with_tag(TagRecord::param("id", "user id"))
            .with_tag(TagRecord::param("email", ""))
            .with_tag(TagRecord::param("[nickname]", ""))
            .with_tag(TagRecord::param("_user", ""));

        let route = interpret(&record).into_route().unwrap();
        assert_eq!(route.name, "create");
        assert_eq!(route.description, "Create a user");
        assert_eq!(route.verb, Verb::Post);
        assert_eq!(route.path, "/users/:id");
        assert_eq!(route.returns.type_name, "Object");

        let summary: Vec<_> = route
            .params
            .iter()
            .map(|p| (p.name.as_str(), p.source, p.optional))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("id", ParamSource::Path, false),
                ("email", ParamSource::Body, false),
                ("nickname", ParamSource::Body, true),
                ("user", ParamSource::Local, false),
            ]
        );
        assert_eq!(route.params[0].description.as_deref(), Some("user id"));
    }

    #[test]
    fn test_interpret_missing_route_tag() {
        let record = DocRecord::new("", Some("helper"))
            .with_tag(TagRecord::new(RETURNS_TAG, "{Object} x"));
        assert_eq!(
            interpret(&record),
            Interpretation::NotRoutable(Rejection::MissingRouteTag)
        );
    }

    #[test]
    fn test_interpret_missing_returns_tag() {
        let record =
            DocRecord::new("", Some("helper")).with_tag(TagRecord::new(ROUTE_TAG, "get /x"));
        assert_eq!(
            interpret(&record),
            Interpretation::NotRoutable(Rejection::MissingReturnsTag)
        );
    }

    #[test]
    fn test_interpret_malformed_tags() {
        let record = routable("delete /users", "{Object} x");
        assert!(matches!(
            interpret(&record),
            Interpretation::NotRoutable(Rejection::MalformedRoute(_))
        ));

        let record = routable("get /users", "Object x");
        assert!(matches!(
            interpret(&record),
            Interpretation::NotRoutable(Rejection::MalformedReturns(_))
        ));
    }

    #[test]
    fn test_interpret_missing_context() {
        let mut record = routable("get /users", "{Array} users");
        record.context = None;
        assert_eq!(
            interpret(&record),
            Interpretation::NotRoutable(Rejection::MissingContext)
        );
    }

    #[test]
    fn test_param_name_falls_back_to_payload() {
        let record = routable("get /users", "{Array} users")
            .with_tag(TagRecord::new(PARAM_TAG, "[limit] max results"));
        let route = interpret(&record).into_route().unwrap();
        assert_eq!(route.params[0].name, "limit");
        assert!(route.params[0].optional);
        assert_eq!(route.params[0].source, ParamSource::Query);
    }
}
