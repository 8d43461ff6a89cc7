//! Structured schema synthesizer
//!
//! Builds a named record from one prepared exemplar document and the rule
//! tree of its modality. Only keys present in both the document and the rule
//! tree become fields; everything else in the sidecar stays unvalidated.

use serde_json::Value;

use crate::config::{Rule, RuleTree};

use super::errors::{SchemaError, SchemaResult};
use super::metadata::escape_field_name;
use super::rules::compile_rule;
use super::types::SchemaNode;

/// Synthesizes a record schema named `name` from a prepared exemplar.
pub fn synthesize(
    document: &Value,
    rules: &RuleTree,
    name: &str,
    modality: &str,
) -> SchemaResult<SchemaNode> {
    let mut fields = Vec::new();

    for (key, rule) in rules {
        let field_name = escape_field_name(key);
        let Some(value) = document.get(field_name.as_str()) else {
            continue;
        };
        let qualified = format!("{}_{}", name, key);

        let node = match rule {
            Rule::Nested(inner) => {
                if !value.is_object() {
                    return Err(SchemaError::exemplar_mismatch(
                        qualified,
                        modality,
                        "nested rules need an object value",
                    ));
                }
                synthesize(value, inner, &qualified, modality)?
            }
            Rule::Leaf(rule) => SchemaNode::Scalar(compile_rule(&qualified, modality, rule, value)?),
        };
        fields.push((field_name, node));
    }

    Ok(SchemaNode::Record {
        name: name.to_string(),
        fields,
    })
}
