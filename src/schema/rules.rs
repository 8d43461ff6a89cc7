//! Constraint rule compiler
//!
//! Rule grammar, one rule string per configured field:
//! - `=`        exact match (tuple of literals for sequences)
//! - `*`        type only
//! - `~=<tol>`  numeric value within `[v - tol, v + tol]`
//! - `r<regex>` string matching the regular expression

use regex::Regex;
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::{Constraint, JsonKind, ScalarSpec};

/// A rule string parsed but not yet applied to an exemplar
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRule {
    Exact,
    TypeOnly,
    Tolerance(f64),
    Pattern(String),
}

/// Parses a rule string.
///
/// Fails with `SG_UNSUPPORTED_RULE` for strings outside the grammar, for
/// tolerances that are not finite non-negative numbers and for patterns that
/// do not compile.
pub fn parse_rule(field: &str, modality: &str, rule: &str) -> SchemaResult<ParsedRule> {
    if rule == "=" {
        return Ok(ParsedRule::Exact);
    }
    if rule == "*" {
        return Ok(ParsedRule::TypeOnly);
    }
    if let Some(raw_tol) = rule.strip_prefix("~=") {
        let tol: f64 = raw_tol
            .trim()
            .parse()
            .map_err(|_| SchemaError::unsupported_rule(field, modality, rule))?;
        if !tol.is_finite() || tol < 0.0 {
            return Err(SchemaError::unsupported_rule(field, modality, rule));
        }
        return Ok(ParsedRule::Tolerance(tol));
    }
    if let Some(pattern) = rule.strip_prefix('r') {
        Regex::new(pattern).map_err(|_| SchemaError::unsupported_rule(field, modality, rule))?;
        return Ok(ParsedRule::Pattern(pattern.to_string()));
    }
    Err(SchemaError::unsupported_rule(field, modality, rule))
}

/// Compiles a rule against one exemplar value into a constrained scalar.
///
/// # Arguments
///
/// * `field` - Name used in error reports (the schema-qualified field name)
/// * `modality` - Modality whose configuration declared the rule
/// * `rule` - The rule string
/// * `exemplar` - Value taken from the exemplar sidecar
pub fn compile_rule(
    field: &str,
    modality: &str,
    rule: &str,
    exemplar: &Value,
) -> SchemaResult<ScalarSpec> {
    let kind = JsonKind::of(exemplar);

    match parse_rule(field, modality, rule)? {
        ParsedRule::Exact => match exemplar {
            Value::Array(items) => Ok(ScalarSpec::new(
                JsonKind::Array,
                Constraint::EqualsTuple(items.clone()),
            )),
            other => Ok(ScalarSpec::new(kind, Constraint::Equals(other.clone()))),
        },
        ParsedRule::TypeOnly => Ok(ScalarSpec::new(kind, Constraint::TypeOnly)),
        ParsedRule::Tolerance(tol) => {
            let center = exemplar.as_f64().ok_or_else(|| {
                SchemaError::exemplar_mismatch(
                    field,
                    modality,
                    format!("tolerance rule needs a number, found {}", kind.type_name()),
                )
            })?;
            // bounds carry the decimal precision of their operands, so a
            // boundary written as a literal (2.3 ~= 0.005 -> 2.305) is inside
            let places = decimal_places(center).max(decimal_places(tol));
            Ok(ScalarSpec::new(
                kind,
                Constraint::Range {
                    min: round_to_places(center - tol, places),
                    max: round_to_places(center + tol, places),
                },
            ))
        }
        ParsedRule::Pattern(pattern) => {
            let text = exemplar.as_str().ok_or_else(|| {
                SchemaError::exemplar_mismatch(
                    field,
                    modality,
                    format!("pattern rule needs a string, found {}", kind.type_name()),
                )
            })?;
            let regex =
                Regex::new(&pattern).map_err(|_| SchemaError::unsupported_rule(field, modality, rule))?;
            if !regex.is_match(text) {
                return Err(SchemaError::exemplar_mismatch(
                    field,
                    modality,
                    format!("'{}' does not match '{}'", text, pattern),
                ));
            }
            Ok(ScalarSpec::new(JsonKind::String, Constraint::Pattern(pattern)))
        }
    }
}

/// Digits after the decimal point in the shortest text form of `x`
fn decimal_places(x: f64) -> usize {
    x.to_string()
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len())
}

/// Rounds `x` to `places` decimals, leaving it untouched when scaling
/// would leave the exactly representable integer range.
fn round_to_places(x: f64, places: usize) -> f64 {
    const MAX_PLACES: usize = 15;
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;

    if places > MAX_PLACES {
        return x;
    }
    let scale = 10f64.powi(places as i32);
    let scaled = (x * scale).round();
    if !scaled.is_finite() || scaled.abs() >= EXACT_LIMIT {
        return x;
    }
    scaled / scale
}
