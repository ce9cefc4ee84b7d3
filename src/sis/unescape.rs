//! Recursive HTML-entity unescaping for decoded SIS payloads.
//!
//! The SIS entity-escapes text inside JSON responses (`&amp;`, `&#39;`, ...),
//! so every decoded body is unescaped before it reaches typed models.

use serde_json::Value;

/// Unescapes HTML entities in every string within `value`, including object
/// keys. Container shape is preserved; non-string leaves pass through
/// untouched.
pub fn unescape_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(unescape_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(unescape_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (unescape_str(&key), unescape_value(inner)))
                .collect(),
        ),
        other => other,
    }
}

/// Unescapes a single string, skipping the allocation when no entity marker is
/// present.
pub fn unescape_str(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    htmlize::unescape(s).into_owned()
}
