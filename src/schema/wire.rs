//! Wire form of synthesized schemas
//!
//! Schemas are persisted and validated as JSON Schema (Draft 2020-12).
//! Records allow additional properties, so sidecar fields that no rule
//! governs are accepted. Unions are `anyOf` over their variants; the
//! `discriminator` keyword is an annotation the validator ignores.

use serde_json::{json, Map, Value};

use super::types::{Constraint, JsonKind, ScalarSpec, SchemaNode};

/// Dialect declared at the root of every wire schema
pub const WIRE_SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Serializes a structured schema into its wire document.
pub fn to_wire_schema(node: &SchemaNode) -> Value {
    let mut doc = node_to_wire(node);
    if let Value::Object(obj) = &mut doc {
        obj.insert("$schema".into(), Value::String(WIRE_SCHEMA_DIALECT.into()));
    }
    doc
}

fn node_to_wire(node: &SchemaNode) -> Value {
    match node {
        SchemaNode::Scalar(spec) => scalar_to_wire(spec),
        SchemaNode::Record { name, fields } => {
            let mut properties = Map::new();
            let mut required = Vec::with_capacity(fields.len());
            for (field_name, field) in fields {
                properties.insert(field_name.clone(), node_to_wire(field));
                required.push(Value::String(field_name.clone()));
            }
            json!({
                "title": name,
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": true,
            })
        }
        SchemaNode::Union {
            discriminator,
            variants,
        } => {
            let mut mapping = Map::new();
            for (i, (name, _)) in variants.iter().enumerate() {
                mapping.insert(name.clone(), Value::String(format!("#/anyOf/{}", i)));
            }
            json!({
                "anyOf": variants.iter().map(|(_, v)| node_to_wire(v)).collect::<Vec<_>>(),
                "discriminator": {
                    "propertyName": discriminator,
                    "mapping": mapping,
                },
            })
        }
    }
}

fn scalar_to_wire(spec: &ScalarSpec) -> Value {
    let type_name = spec.kind.type_name();
    match &spec.constraint {
        Constraint::Equals(literal) => json!({"type": type_name, "const": literal}),
        // prefixItems must not be empty
        Constraint::EqualsTuple(items) if items.is_empty() => {
            json!({"type": "array", "maxItems": 0})
        }
        Constraint::EqualsTuple(items) => {
            let prefix: Vec<Value> = items
                .iter()
                .map(|item| json!({"type": JsonKind::of(item).type_name(), "const": item}))
                .collect();
            json!({
                "type": "array",
                "prefixItems": prefix,
                "items": false,
                "minItems": items.len(),
                "maxItems": items.len(),
            })
        }
        Constraint::TypeOnly => json!({"type": type_name}),
        Constraint::Range { min, max } => {
            json!({"type": type_name, "minimum": min, "maximum": max})
        }
        Constraint::Pattern(pattern) => json!({"type": "string", "pattern": pattern}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::rules::compile_rule;

    fn scalar(rule: &str, exemplar: Value) -> Value {
        let spec = compile_rule("f", "mri", rule, &exemplar).unwrap();
        scalar_to_wire(&spec)
    }

    #[test]
    fn test_scalar_wire_forms() {
        assert_eq!(scalar("*", json!(10.0)), json!({"type": "number"}));
        assert_eq!(
            scalar("~=.05", json!(10.0)),
            json!({"type": "number", "minimum": 9.95, "maximum": 10.05})
        );
        assert_eq!(scalar("=", json!(10.0)), json!({"type": "number", "const": 10.0}));
        assert_eq!(
            scalar("r^[aA]{3}[0-4]$", json!("AaA3")),
            json!({"type": "string", "pattern": "^[aA]{3}[0-4]$"})
        );
    }

    #[test]
    fn test_tuple_wire_form() {
        assert_eq!(
            scalar("=", json!(["M", 2])),
            json!({
                "type": "array",
                "prefixItems": [
                    {"type": "string", "const": "M"},
                    {"type": "integer", "const": 2}
                ],
                "items": false,
                "minItems": 2,
                "maxItems": 2
            })
        );
        assert_eq!(scalar("=", json!([])), json!({"type": "array", "maxItems": 0}));
    }

    #[test]
    fn test_record_and_union_wire_forms() {
        let record = |name: &str| SchemaNode::Record {
            name: name.into(),
            fields: vec![(
                "EchoTime".into(),
                SchemaNode::Scalar(ScalarSpec::new(JsonKind::Number, Constraint::TypeOnly)),
            )],
        };
        let wire = to_wire_schema(&record("anat_T1w"));
        assert_eq!(wire["$schema"], json!(WIRE_SCHEMA_DIALECT));
        assert_eq!(wire["title"], json!("anat_T1w"));
        assert_eq!(wire["required"], json!(["EchoTime"]));
        assert_eq!(wire["additionalProperties"], json!(true));

        let union = SchemaNode::Union {
            discriminator: "__instrument__".into(),
            variants: vec![("a".into(), record("a")), ("b".into(), record("b"))],
        };
        let wire = to_wire_schema(&union);
        assert_eq!(wire["anyOf"].as_array().unwrap().len(), 2);
        assert_eq!(wire["anyOf"][1]["title"], json!("b"));
        assert_eq!(wire["discriminator"]["propertyName"], json!("__instrument__"));
        assert_eq!(wire["discriminator"]["mapping"]["b"], json!("#/anyOf/1"));
    }

    #[test]
    fn test_wire_schema_is_stable() {
        let spec = compile_rule("f", "mri", "=", &json!([1, 2])).unwrap();
        let node = SchemaNode::Record {
            name: "r".into(),
            fields: vec![("f".into(), SchemaNode::Scalar(spec))],
        };
        let first = serde_json::to_string_pretty(&to_wire_schema(&node)).unwrap();
        let second = serde_json::to_string_pretty(&to_wire_schema(&node)).unwrap();
        assert_eq!(first, second);
    }
}
