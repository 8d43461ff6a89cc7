//! Sidecar metadata preparation
//!
//! Before a sidecar is used to synthesize a schema or is validated against
//! one, its field names are escaped and the discriminator aggregate is
//! attached. Synthesis and validation must prepare documents identically.

use serde_json::{Map, Value};

use crate::observability::{log_event, Event};

use super::types::DISCRIMINATOR_FIELD;

/// Suffix appended to field names that collide with a reserved identifier
pub const RESERVED_SUFFIX: &str = "__";

/// Identifiers that cannot name a record field
const RESERVED_IDENTIFIERS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
];

/// Returns whether `name` is a reserved identifier
pub fn is_reserved(name: &str) -> bool {
    RESERVED_IDENTIFIERS.contains(&name)
}

/// Escapes a field name so it never collides with a reserved identifier.
pub fn escape_field_name(name: &str) -> String {
    if is_reserved(name) {
        format!("{}{}", name, RESERVED_SUFFIX)
    } else {
        name.to_string()
    }
}

/// Reverses `escape_field_name`.
pub fn unescape_field_name(name: &str) -> &str {
    match name.strip_suffix(RESERVED_SUFFIX) {
        Some(base) if is_reserved(base) => base,
        _ => name,
    }
}

/// A field literally named like an escaped reserved name keeps its value;
/// the reserved field is dropped and the collision logged.
fn escape_keys(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut escaped = Map::new();
            for (key, inner) in obj {
                let name = escape_field_name(key);
                if name != *key && obj.contains_key(&name) {
                    log_event(
                        Event::FieldNameCollision,
                        &[("field", key.as_str()), ("kept", name.as_str())],
                    );
                    continue;
                }
                escaped.insert(name, escape_keys(inner));
            }
            Value::Object(escaped)
        }
        other => other.clone(),
    }
}

/// Returns the discriminator aggregate: the sidecar's value for each
/// instrument tag, null when absent.
pub fn discriminator_value(metadata: &Value, instrument_tags: &[String]) -> Value {
    Value::Array(
        instrument_tags
            .iter()
            .map(|tag| metadata.get(tag.as_str()).cloned().unwrap_or(Value::Null))
            .collect(),
    )
}

/// Prepares raw sidecar metadata for synthesis or validation.
///
/// Non-object documents are treated as empty objects.
pub fn prepare_metadata(metadata: &Value, instrument_tags: &[String]) -> Value {
    let mut prepared = match escape_keys(metadata) {
        Value::Object(obj) => obj,
        _ => Map::new(),
    };
    prepared.insert(
        DISCRIMINATOR_FIELD.to_string(),
        discriminator_value(metadata, instrument_tags),
    );
    Value::Object(prepared)
}
