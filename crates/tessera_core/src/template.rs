//! Placeholder rendering for prompts, paths, commands and plugin configs.
//!
//! Placeholders use `{{reference}}` syntax. A reference is a dotted path into the
//! context, where each segment may carry array indices:
//!
//! - `{{industry}}` - top-level value
//! - `{{search.title}}` - object field
//! - `{{steps[0]}}` - array element
//! - `{{steps[1].summary}}` - field of an array element
//!
//! Strings render verbatim, `null` renders empty, numbers and booleans use their JSON
//! form, and objects/arrays render as compact JSON. Unknown references are errors.

use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::LazyLock;
use tessera_error::{TemplateError, TemplateErrorKind};

const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([^{}]+?)\s*\}\}";

static PLACEHOLDER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN));

fn placeholder_regex() -> Result<&'static Regex, TemplateError> {
    PLACEHOLDER.as_ref().map_err(|e| {
        TemplateError::new(TemplateErrorKind::Malformed(format!(
            "invalid placeholder pattern: {}",
            e
        )))
    })
}

/// Render every placeholder in `template` against `context`.
///
/// # Errors
///
/// Returns an error if a placeholder is malformed or references an unknown value.
///
/// # Examples
///
/// ```
/// use tessera_core::render;
/// use serde_json::json;
///
/// let context = json!({"industry": "Kletterhalle", "steps": [{"name": "Boulderwelt"}]});
/// let text = render("Write about {{industry}} named {{steps[0].name}}", &context).unwrap();
/// assert_eq!(text, "Write about Kletterhalle named Boulderwelt");
/// ```
pub fn render(template: &str, context: &JsonValue) -> Result<String, TemplateError> {
    if !template.contains("{{") {
        return Ok(template.to_string());
    }

    let regex = placeholder_regex()?;
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for captures in regex.captures_iter(template) {
        let (Some(whole), Some(reference)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        rendered.push_str(&template[last..whole.start()]);
        let value = lookup(context, reference.as_str())?.ok_or_else(|| {
            TemplateError::new(TemplateErrorKind::UnknownReference(
                reference.as_str().to_string(),
            ))
        })?;
        rendered.push_str(&value_to_text(reference.as_str(), value)?);
        last = whole.end();
    }
    rendered.push_str(&template[last..]);

    Ok(rendered)
}

/// Render every string inside a JSON value.
///
/// A string consisting of exactly one placeholder is replaced by the referenced value
/// itself, preserving its JSON type; all other strings are rendered as text.
///
/// # Errors
///
/// Returns an error if any string fails to render.
///
/// # Examples
///
/// ```
/// use tessera_core::render_value;
/// use serde_json::json;
///
/// let context = json!({"query": "climbing", "limit": 3});
/// let config = json!({"q": "best {{query}} gyms", "n": "{{limit}}"});
/// let resolved = render_value(&config, &context).unwrap();
/// assert_eq!(resolved, json!({"q": "best climbing gyms", "n": 3}));
/// ```
pub fn render_value(value: &JsonValue, context: &JsonValue) -> Result<JsonValue, TemplateError> {
    match value {
        JsonValue::String(text) => {
            if let Some(reference) = sole_placeholder(text) {
                return lookup(context, reference)?.cloned().ok_or_else(|| {
                    TemplateError::new(TemplateErrorKind::UnknownReference(reference.to_string()))
                });
            }
            Ok(JsonValue::String(render(text, context)?))
        }
        JsonValue::Array(items) => items
            .iter()
            .map(|item| render_value(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        JsonValue::Object(map) => {
            let mut resolved = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                resolved.insert(key.clone(), render_value(item, context)?);
            }
            Ok(JsonValue::Object(resolved))
        }
        other => Ok(other.clone()),
    }
}

/// Resolve a reference path against a context.
///
/// Returns `Ok(None)` when the path is well-formed but absent.
///
/// # Errors
///
/// Returns an error if the path syntax is malformed.
pub fn lookup<'a>(context: &'a JsonValue, reference: &str) -> Result<Option<&'a JsonValue>, TemplateError> {
    let mut current = context;
    for segment in reference.split('.') {
        let segment = segment.trim();
        let (name, indices) = parse_segment(segment, reference)?;

        if !name.is_empty() {
            let next = match current {
                JsonValue::Object(map) => map.get(name),
                JsonValue::Array(items) => name.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }

        for index in indices {
            match current.get(index) {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }
    }
    Ok(Some(current))
}

fn parse_segment<'a>(segment: &'a str, reference: &str) -> Result<(&'a str, Vec<usize>), TemplateError> {
    let malformed = || TemplateError::new(TemplateErrorKind::Malformed(reference.to_string()));

    let Some(open) = segment.find('[') else {
        if segment.is_empty() || segment.contains(']') {
            return Err(malformed());
        }
        return Ok((segment, Vec::new()));
    };

    let name = &segment[..open];
    let mut indices = Vec::new();
    let mut rest = &segment[open..];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
        let close = inner.find(']').ok_or_else(malformed)?;
        let index = inner[..close].trim().parse::<usize>().map_err(|_| malformed())?;
        indices.push(index);
        rest = &inner[close + 1..];
    }
    Ok((name, indices))
}

fn sole_placeholder(text: &str) -> Option<&str> {
    let inner = text.trim().strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}

fn value_to_text(reference: &str, value: &JsonValue) -> Result<String, TemplateError> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Null => Ok(String::new()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        other => serde_json::to_string(other).map_err(|e| {
            TemplateError::new(TemplateErrorKind::Render {
                reference: reference.to_string(),
                message: e.to_string(),
            })
        }),
    }
}
