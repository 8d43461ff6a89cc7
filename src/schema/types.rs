//! Structured schema model
//!
//! A synthesized schema is a tree of:
//! - scalar leaves carrying a value constraint
//! - named records with ordered fields
//! - discriminated unions of records

use serde_json::Value;

/// Name of the synthetic discriminator field attached to every sidecar
pub const DISCRIMINATOR_FIELD: &str = "__instrument__";

/// Runtime type of a JSON value, as understood by the wire schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    /// Returns the kind of an exemplar value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Boolean,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    JsonKind::Integer
                } else {
                    JsonKind::Number
                }
            }
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }

    /// Returns the JSON Schema type name
    pub fn type_name(&self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Boolean => "boolean",
            JsonKind::Integer => "integer",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        }
    }

    /// Returns whether the kind is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, JsonKind::Integer | JsonKind::Number)
    }
}

/// Value constraint attached to a scalar
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Value must equal this literal
    Equals(Value),
    /// Value must be a sequence equal to these literals, in order
    EqualsTuple(Vec<Value>),
    /// Any value of the scalar's kind
    TypeOnly,
    /// Numeric value in the closed interval
    Range { min: f64, max: f64 },
    /// String matching the regular expression
    Pattern(String),
}

/// A typed scalar with its constraint
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSpec {
    pub kind: JsonKind,
    pub constraint: Constraint,
}

impl ScalarSpec {
    pub fn new(kind: JsonKind, constraint: Constraint) -> Self {
        Self { kind, constraint }
    }
}

/// Node of a structured schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Scalar(ScalarSpec),
    Record {
        /// Unique schema name
        name: String,
        /// Fields in rule-tree order
        fields: Vec<(String, SchemaNode)>,
    },
    Union {
        /// Field used to pick a variant
        discriminator: String,
        /// Variants keyed by schema name, in partition order
        variants: Vec<(String, SchemaNode)>,
    },
}

impl SchemaNode {
    /// Returns the record or union name, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            SchemaNode::Record { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns a record field by name
    pub fn field(&self, field_name: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Record { fields, .. } => fields
                .iter()
                .find(|(name, _)| name == field_name)
                .map(|(_, node)| node),
            _ => None,
        }
    }

    /// Returns the number of union variants, 1 for anything else
    pub fn variant_count(&self) -> usize {
        match self {
            SchemaNode::Union { variants, .. } => variants.len(),
            _ => 1,
        }
    }

    /// Returns whether this node is a union
    pub fn is_union(&self) -> bool {
        matches!(self, SchemaNode::Union { .. })
    }
}
