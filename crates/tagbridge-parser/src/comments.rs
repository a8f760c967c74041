//! Default comment extractor for Rust doc comments.
//!
//! `//!` runs become context-free records (where `@module` usually lives);
//! `///` runs become records named after the item that follows them.
//! Inside a run, text before the first `@tag` line is the description and
//! non-tag lines after a tag continue that tag's payload.

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use tagbridge_domain::tag::PARAM_TAG;
use tagbridge_domain::{CommentParser, DocRecord, TagRecord};
use tracing::warn;

static TAG_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@(\w+)(?:\s+(.*))?$").expect("tag line regex should be valid"));

static PARAM_FIELDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\{([^}]*)\}\s*)?(\S+)(?:\s+(.*))?$").expect("param regex should be valid")
});

static ITEM_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+\S+\s+)?(?:fn|struct|enum|mod|trait|const|static|type)\s+([A-Za-z_]\w*)",
    )
    .expect("item regex should be valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocKind {
    Inner,
    Outer,
}

/// Extracts [`DocRecord`]s from Rust doc comments
#[derive(Debug, Clone, Copy, Default)]
pub struct DocCommentParser;

impl DocCommentParser {
    /// Create a parser
    pub fn new() -> Self {
        Self
    }
}

impl CommentParser for DocCommentParser {
    type Error = ParseError;

    fn parse_comments(&self, source: &str) -> Result<Vec<DocRecord>, ParseError> {
        let lines: Vec<&str> = source.lines().collect();
        let mut records = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let Some((kind, _)) = doc_line(lines[i]) else {
                i += 1;
                continue;
            };

            let mut body = Vec::new();
            while let Some((k, text)) = lines.get(i).and_then(|l| doc_line(l)) {
                if k != kind {
                    break;
                }
                body.push((i + 1, text));
                i += 1;
            }

            let context = match kind {
                DocKind::Inner => None,
                DocKind::Outer => item_name(&lines[i..]),
            };
            records.push(build_record(&body, context));
        }

        Ok(records)
    }
}

/// Classify a doc-comment line and strip its marker
fn doc_line(line: &str) -> Option<(DocKind, &str)> {
    let trimmed = line.trim_start();
    let (kind, rest) = if let Some(rest) = trimmed.strip_prefix("//!") {
        (DocKind::Inner, rest)
    } else if let Some(rest) = trimmed.strip_prefix("///") {
        if rest.starts_with('/') {
            return None;
        }
        (DocKind::Outer, rest)
    } else {
        return None;
    };
    Some((kind, rest.strip_prefix(' ').unwrap_or(rest)))
}

/// Name of the first item after a doc block, skipping attributes
fn item_name(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !l.starts_with("#["))
        .and_then(|l| ITEM_NAME.captures(l))
        .map(|caps| caps[1].to_string())
}

fn build_record(body: &[(usize, &str)], context: Option<String>) -> DocRecord {
    let mut description: Vec<&str> = Vec::new();
    let mut tags: Vec<(usize, TagRecord)> = Vec::new();

    for &(line, text) in body {
        let text = text.trim();
        if let Some(caps) = TAG_LINE.captures(text) {
            let payload = caps.get(2).map_or("", |m| m.as_str().trim());
            tags.push((line, TagRecord::new(&caps[1], payload)));
        } else if let Some((_, tag)) = tags.last_mut() {
            if !text.is_empty() {
                if !tag.string.is_empty() {
                    tag.string.push(' ');
                }
                tag.string.push_str(text);
            }
        } else {
            description.push(text);
        }
    }

    let mut record = DocRecord::new(description.join("\n").trim(), context.as_deref());
    for (line, mut tag) in tags {
        if tag.kind == PARAM_TAG {
            split_param(&mut tag, line);
        }
        record.push_tag(tag);
    }
    record
}

/// Fill the `types`, `name` and `description` sub-fields of a `@param` tag.
///
/// A payload with no name leaves the tag unsplit (`name: None`).
fn split_param(tag: &mut TagRecord, line: usize) {
    let Some(caps) = PARAM_FIELDS
        .captures(&tag.string)
        .filter(|caps| !caps[2].starts_with('{'))
    else {
        warn!(line, payload = %tag.string, "@param tag has no name");
        return;
    };
    let name = caps[2].to_string();

    let types = caps
        .get(1)
        .map(|m| {
            m.as_str()
                .split('|')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let description = caps
        .get(3)
        .map(|m| m.as_str().trim().to_string())
        .filter(|d| !d.is_empty());

    tag.types = types;
    tag.name = Some(name);
    tag.description = description;
}
