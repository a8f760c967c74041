//! Tag records produced by a comment-block extractor.
//!
//! A [`DocRecord`] is one documented symbol. Its tags are grouped by tag
//! name; within one name the records keep documentation order.

use serde::Serialize;
use std::collections::BTreeMap;

/// Tag name that marks the module-identity record of a source unit.
pub const MODULE_TAG: &str = "module";

/// Tag name that declares the HTTP verb and path of a method.
pub const ROUTE_TAG: &str = "apiRoute";

/// Tag name that declares the return shape of a method.
pub const RETURNS_TAG: &str = "apiReturns";

/// Tag name of a parameter declaration.
pub const PARAM_TAG: &str = "param";

/// A single `@tag` occurrence inside a comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    /// Tag name without the leading `@`
    pub kind: String,

    /// Raw payload following the tag name
    pub string: String,

    /// Parsed name sub-field (`@param {T} name ...`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Parsed description sub-field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parsed type list (`{String|Number}` → `["String", "Number"]`)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

impl TagRecord {
    /// Create a tag with only a raw payload
    pub fn new(kind: impl Into<String>, string: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            string: string.into(),
            ..Default::default()
        }
    }

    /// Create a parameter tag with its parsed name
    pub fn param(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        let description = description.into();
        Self {
            kind: PARAM_TAG.to_string(),
            string: format!("{} {}", name, description).trim().to_string(),
            name: Some(name),
            description: Some(description).filter(|d| !d.is_empty()),
            types: Vec::new(),
        }
    }
}

/// One documented symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocRecord {
    /// Free-form description preceding the first tag
    pub description: String,

    /// Tags keyed by tag name, each list in documentation order
    pub tags: BTreeMap<String, Vec<TagRecord>>,

    /// Name of the documented item (function name), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl DocRecord {
    /// Create an empty record with a description and a context name
    pub fn new(description: impl Into<String>, context: Option<&str>) -> Self {
        Self {
            description: description.into(),
            tags: BTreeMap::new(),
            context: context.map(str::to_string),
        }
    }

    /// Append a tag, keeping documentation order within its name
    pub fn push_tag(&mut self, tag: TagRecord) {
        self.tags.entry(tag.kind.clone()).or_default().push(tag);
    }

    /// Builder-style variant of [`DocRecord::push_tag`]
    pub fn with_tag(mut self, tag: TagRecord) -> Self {
        self.push_tag(tag);
        self
    }

    /// First tag with the given name
    pub fn first_tag(&self, kind: &str) -> Option<&TagRecord> {
        self.tags.get(kind).and_then(|tags| tags.first())
    }

    /// All tags with the given name, in documentation order
    pub fn tags_named(&self, kind: &str) -> &[TagRecord] {
        self.tags.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether this record carries the module-identity tag
    pub fn is_module(&self) -> bool {
        self.first_tag(MODULE_TAG).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_keep_documentation_order() {
        let record = DocRecord::new("Create a user", Some("create"))
            .with_tag(TagRecord::param("email", "address"))
            .with_tag(TagRecord::new(ROUTE_TAG, "post /users"))
            .with_tag(TagRecord::param("[nickname]", ""));

        let params = record.tags_named(PARAM_TAG);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name.as_deref(), Some("email"));
        assert_eq!(params[1].name.as_deref(), Some("[nickname]"));
        assert_eq!(params[1].description, None);
    }

    #[test]
    fn test_missing_tag_kind() {
        let record = DocRecord::new("", None);
        assert!(record.first_tag(ROUTE_TAG).is_none());
        assert!(record.tags_named(PARAM_TAG).is_empty());
        assert!(!record.is_module());
    }

    #[test]
    fn test_module_record() {
        let record = DocRecord::new("User management", None)
            .with_tag(TagRecord::new(MODULE_TAG, "Users"));
        assert!(record.is_module());
        assert_eq!(record.first_tag(MODULE_TAG).unwrap().string, "Users");
    }
}
