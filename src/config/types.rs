//! Modality configuration documents
//!
//! One document per modality:
//!
//! ```json
//! {
//!   "instrument": {
//!     "grouping_tags": ["Manufacturer", "ManufacturersModelName"],
//!     "uid_tags": ["DeviceSerialNumber"],
//!     "version_tags": ["SoftwareVersions"]
//!   },
//!   "properties": { "EchoTime": "~=0.0005", "Coil": { "Name": "=" } }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{parse_rule, SchemaError, SchemaResult, DISCRIMINATOR_FIELD};

/// Rules keyed by field name, in a deterministic order
pub type RuleTree = BTreeMap<String, Rule>;

/// A per-field rule: a rule string for a leaf, a nested tree for an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rule {
    Leaf(String),
    Nested(RuleTree),
}

/// Instrument-identifying tags, coarse to fine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Tags always used for grouping
    pub grouping_tags: Vec<String>,

    /// Unique instrument tags, used when instruments are not uniform
    #[serde(default)]
    pub uid_tags: Vec<String>,

    /// Software version tags, used when schemas are version specific
    #[serde(default)]
    pub version_tags: Vec<String>,
}

impl InstrumentConfig {
    /// Returns the ordered grouping tags for a run, de-duplicated keeping
    /// the first occurrence.
    pub fn grouping_levels(&self, uniform_instruments: bool, version_specific: bool) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        let mut extend = |source: &[String]| {
            for tag in source {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        };
        extend(&self.grouping_tags);
        if !uniform_instruments {
            extend(&self.uid_tags);
        }
        if version_specific {
            extend(&self.version_tags);
        }
        tags
    }
}

/// Configuration of one modality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalityConfig {
    /// Modality name (set on load)
    #[serde(skip)]
    pub modality: String,

    /// Instrument grouping tags
    pub instrument: InstrumentConfig,

    /// Field rules
    pub properties: RuleTree,
}

impl ModalityConfig {
    /// Builds a configuration from its JSON document.
    ///
    /// The document is validated and the discriminator field is added to
    /// the properties with an exact-match rule.
    pub fn from_value(modality: &str, document: Value) -> SchemaResult<Self> {
        let mut config: ModalityConfig = serde_json::from_value(document)
            .map_err(|e| SchemaError::config_invalid(modality, e.to_string()))?;
        config.modality = modality.to_string();
        config.validate()?;
        config
            .properties
            .insert(DISCRIMINATOR_FIELD.to_string(), Rule::Leaf("=".into()));
        Ok(config)
    }

    /// Builds a configuration from JSON text
    pub fn from_json_str(modality: &str, text: &str) -> SchemaResult<Self> {
        let document: Value = serde_json::from_str(text)
            .map_err(|e| SchemaError::config_invalid(modality, format!("Invalid JSON: {}", e)))?;
        Self::from_value(modality, document)
    }

    fn validate(&self) -> SchemaResult<()> {
        if self.instrument.grouping_tags.is_empty() {
            return Err(SchemaError::config_invalid(
                &self.modality,
                "instrument.grouping_tags must not be empty",
            ));
        }
        validate_rules(&self.modality, &self.properties)
    }
}

fn validate_rules(modality: &str, rules: &RuleTree) -> SchemaResult<()> {
    for (field, rule) in rules {
        match rule {
            Rule::Leaf(rule) => {
                parse_rule(field, modality, rule)?;
            }
            Rule::Nested(inner) => validate_rules(modality, inner)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "instrument": {
                "grouping_tags": ["Manufacturer", "ManufacturersModelName"],
                "uid_tags": ["DeviceSerialNumber", "Manufacturer"],
                "version_tags": ["SoftwareVersions"]
            },
            "properties": {"EchoTime": "=", "Coil": {"Name": "*"}}
        })
    }

    #[test]
    fn test_load_adds_discriminator_rule() {
        let config = ModalityConfig::from_value("mri", sample()).unwrap();
        assert_eq!(config.modality, "mri");
        assert_eq!(
            config.properties.get(DISCRIMINATOR_FIELD),
            Some(&Rule::Leaf("=".into()))
        );
        assert!(matches!(config.properties.get("Coil"), Some(Rule::Nested(_))));
    }

    #[test]
    fn test_grouping_levels() {
        let config = ModalityConfig::from_value("mri", sample()).unwrap();
        let instrument = &config.instrument;
        assert_eq!(
            instrument.grouping_levels(true, false),
            vec!["Manufacturer", "ManufacturersModelName"]
        );
        assert_eq!(
            instrument.grouping_levels(false, true),
            vec![
                "Manufacturer",
                "ManufacturersModelName",
                "DeviceSerialNumber",
                "SoftwareVersions"
            ]
        );
    }

    #[test]
    fn test_unknown_rule_rejected_on_load() {
        let mut doc = sample();
        doc["properties"]["Coil"]["Name"] = json!("<=3");
        let err = ModalityConfig::from_value("mri", doc).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::UnsupportedRule);
        assert_eq!(err.field(), Some("Name"));
    }

    #[test]
    fn test_empty_grouping_tags_rejected() {
        let mut doc = sample();
        doc["instrument"]["grouping_tags"] = json!([]);
        let err = ModalityConfig::from_value("meeg", doc).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::ConfigInvalid);
    }
}
