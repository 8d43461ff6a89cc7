//! Wire schema validator
//!
//! Thin wrapper over the `jsonschema` crate. Validation never mutates the
//! document and reports every violation, in validator order.

use std::fmt;

use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::metadata::unescape_field_name;
use super::types::DISCRIMINATOR_FIELD;

/// One failure of a document against a wire schema
#[derive(Debug, Clone, PartialEq)]
pub struct WireViolation {
    /// JSON pointer into the validated document, empty for the root
    pub location: String,
    /// Validator message
    pub message: String,
    /// The offending value
    pub value: Value,
}

impl WireViolation {
    /// Returns the location as dotted field names with reserved-name
    /// escaping undone, e.g. `Coil.type`.
    pub fn field_path(&self) -> String {
        self.location
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let decoded = segment.replace("~1", "/").replace("~0", "~");
                unescape_field_name(&decoded).to_string()
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Returns whether the violation is about the document as a whole
    pub fn is_root(&self) -> bool {
        self.location.is_empty()
    }
}

/// A compiled wire schema
pub struct WireValidator {
    name: String,
    validator: jsonschema::Validator,
}

impl fmt::Debug for WireValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl WireValidator {
    /// Compiles a wire schema document.
    ///
    /// # Errors
    ///
    /// Returns `SG_WIRE_SCHEMA_INVALID` if the document is not a valid schema.
    pub fn compile(name: &str, wire: &Value) -> SchemaResult<Self> {
        let validator = jsonschema::validator_for(wire)
            .map_err(|e| SchemaError::wire_schema_invalid(name, e.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            validator,
        })
    }

    /// Returns the schema name used in reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the document satisfies the schema
    pub fn is_valid(&self, document: &Value) -> bool {
        self.validator.is_valid(document)
    }

    /// Returns every violation of the document
    pub fn violations(&self, document: &Value) -> Vec<WireViolation> {
        self.validator
            .iter_errors(document)
            .map(|error| {
                let message = error.to_string();
                WireViolation {
                    location: error.instance_path.to_string(),
                    message,
                    value: error.instance.into_owned(),
                }
            })
            .collect()
    }
}

/// Validator for a stored series schema.
///
/// A union is checked against the single branch its discriminator selects,
/// so violations keep their field locations. A document whose discriminator
/// selects no branch gets one root-level violation.
#[derive(Debug)]
pub enum SeriesValidator {
    Record(WireValidator),
    Union {
        name: String,
        discriminator: String,
        branches: Vec<(Value, WireValidator)>,
    },
}

impl SeriesValidator {
    /// Compiles a stored wire schema, splitting unions into their branches.
    ///
    /// # Errors
    ///
    /// Returns `SG_WIRE_SCHEMA_INVALID` if the document or a branch is not a
    /// valid schema, or a branch does not pin the discriminator.
    pub fn compile(name: &str, wire: &Value) -> SchemaResult<Self> {
        let Some(variants) = wire.get("anyOf").and_then(Value::as_array) else {
            return Ok(Self::Record(WireValidator::compile(name, wire)?));
        };

        let discriminator = wire
            .pointer("/discriminator/propertyName")
            .and_then(Value::as_str)
            .unwrap_or(DISCRIMINATOR_FIELD)
            .to_string();

        let mut branches = Vec::with_capacity(variants.len());
        for (i, variant) in variants.iter().enumerate() {
            let key = variant
                .get("properties")
                .and_then(|properties| properties.get(&discriminator))
                .and_then(pinned_value)
                .ok_or_else(|| {
                    SchemaError::wire_schema_invalid(
                        name,
                        format!("branch {} does not pin '{}'", i, discriminator),
                    )
                })?;

            let mut branch = variant.clone();
            if let (Value::Object(obj), Some(dialect)) = (&mut branch, wire.get("$schema")) {
                obj.insert("$schema".into(), dialect.clone());
            }
            let validator = WireValidator::compile(&format!("{}#/anyOf/{}", name, i), &branch)?;
            branches.push((key, validator));
        }

        Ok(Self::Union {
            name: name.to_string(),
            discriminator,
            branches,
        })
    }

    /// Returns the schema name used in reports
    pub fn name(&self) -> &str {
        match self {
            Self::Record(validator) => validator.name(),
            Self::Union { name, .. } => name,
        }
    }

    /// Returns whether the document satisfies the schema
    pub fn is_valid(&self, document: &Value) -> bool {
        self.violations(document).is_empty()
    }

    /// Returns every violation of the document
    pub fn violations(&self, document: &Value) -> Vec<WireViolation> {
        match self {
            Self::Record(validator) => validator.violations(document),
            Self::Union {
                discriminator,
                branches,
                ..
            } => {
                let key = document.get(discriminator).cloned().unwrap_or(Value::Null);
                match branches.iter().find(|(pinned, _)| *pinned == key) {
                    Some((_, branch)) => branch.violations(document),
                    None => vec![WireViolation {
                        location: String::new(),
                        message: format!("no schema branch for instrument {}", key),
                        value: key,
                    }],
                }
            }
        }
    }
}

/// The single value a wire property schema admits, if it pins one
fn pinned_value(schema: &Value) -> Option<Value> {
    if let Some(literal) = schema.get("const") {
        return Some(literal.clone());
    }
    match schema.get("prefixItems") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.get("const").cloned())
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        // empty tuple
        None if schema.get("maxItems") == Some(&Value::from(0)) => Some(Value::Array(Vec::new())),
        _ => None,
    }
}
