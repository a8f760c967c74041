//! Parameter source and optionality classification

use once_cell::sync::Lazy;
use regex::Regex;
use tagbridge_domain::{ParamDescriptor, ParamSource, Verb};

/// `_name` (and `_[name]`, which stays local and required)
static LOCAL_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^_(?:(\w+)|\[(\w+)\])$").expect("local param regex should be valid")
});

/// `[name]`
static OPTIONAL_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\w+)\]$").expect("optional param regex should be valid"));

/// Classify one raw parameter name against its route.
///
/// Precedence: local marker, then optional brackets, then source inference
/// from the path (`:name` segment ⇒ path, else body for post and query for get).
pub fn classify_param(raw_name: &str, verb: Verb, path: &str) -> ParamDescriptor {
    if let Some(caps) = LOCAL_PARAM.captures(raw_name) {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        return ParamDescriptor::new(name, ParamSource::Local);
    }

    let (name, optional) = match OPTIONAL_PARAM.captures(raw_name) {
        Some(caps) => (caps[1].to_string(), true),
        None => (raw_name.to_string(), false),
    };

    let source = if has_path_segment(path, &name) {
        ParamSource::Path
    } else {
        match verb {
            Verb::Post => ParamSource::Body,
            Verb::Get => ParamSource::Query,
        }
    };

    ParamDescriptor {
        optional,
        ..ParamDescriptor::new(name, source)
    }
}

/// Whether `path` contains `:name` as a whole segment name
fn has_path_segment(path: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let pattern = format!(r"(?:^|\W):{}(?:\W|$)", regex::escape(name));
    Regex::new(&pattern)
        .map(|re| re.is_match(path))
        .unwrap_or(false)
}
