//! Error types for schema synthesis, storage and configuration
//!
//! Error codes:
//! - SG_UNSUPPORTED_RULE (FATAL)
//! - SG_UNKNOWN_DATATYPE (FATAL)
//! - SG_CONFIG_INVALID (FATAL)
//! - SG_STORE_IO (FATAL)
//! - SG_DATASET_IO (FATAL)
//! - SG_WIRE_SCHEMA_INVALID (FATAL)
//! - SG_EXEMPLAR_MISMATCH (RECOVERABLE)
//! - SG_GROUPING_EXHAUSTED (RECOVERABLE)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The current series fails, the run continues
    Recoverable,
    /// Configuration or I/O bug, the whole run aborts
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Recoverable => write!(f, "RECOVERABLE"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Rule string not understood
    UnsupportedRule,
    /// Datatype has no modality mapping
    UnknownDatatype,
    /// Modality configuration malformed
    ConfigInvalid,
    /// Reading or writing the side folder failed
    StoreIo,
    /// Reading dataset metadata failed
    DatasetIo,
    /// Generated or stored wire schema rejected by the validator
    WireSchemaInvalid,
    /// Exemplar value incompatible with its rule
    ExemplarMismatch,
    /// No grouping level produced a working schema
    GroupingExhausted,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::UnsupportedRule => "SG_UNSUPPORTED_RULE",
            SchemaErrorCode::UnknownDatatype => "SG_UNKNOWN_DATATYPE",
            SchemaErrorCode::ConfigInvalid => "SG_CONFIG_INVALID",
            SchemaErrorCode::StoreIo => "SG_STORE_IO",
            SchemaErrorCode::DatasetIo => "SG_DATASET_IO",
            SchemaErrorCode::WireSchemaInvalid => "SG_WIRE_SCHEMA_INVALID",
            SchemaErrorCode::ExemplarMismatch => "SG_EXEMPLAR_MISMATCH",
            SchemaErrorCode::GroupingExhausted => "SG_GROUPING_EXHAUSTED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::ExemplarMismatch | SchemaErrorCode::GroupingExhausted => {
                Severity::Recoverable
            }
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    field: Option<String>,
    modality: Option<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            modality: None,
        }
    }

    /// Rule string not part of the rule grammar
    pub fn unsupported_rule(
        field: impl Into<String>,
        modality: impl Into<String>,
        rule: &str,
    ) -> Self {
        let field = field.into();
        let modality = modality.into();
        Self {
            code: SchemaErrorCode::UnsupportedRule,
            message: format!(
                "Unsupported constraint '{}' for '{}' in the {} configuration",
                rule, field, modality
            ),
            field: Some(field),
            modality: Some(modality),
        }
    }

    /// Datatype without a modality configuration
    pub fn unknown_datatype(datatype: &str) -> Self {
        Self::new(
            SchemaErrorCode::UnknownDatatype,
            format!("Unknown datatype '{}'", datatype),
        )
    }

    /// Malformed modality configuration
    pub fn config_invalid(modality: impl Into<String>, reason: impl Into<String>) -> Self {
        let modality = modality.into();
        Self {
            code: SchemaErrorCode::ConfigInvalid,
            message: format!("Invalid {} configuration: {}", modality, reason.into()),
            field: None,
            modality: Some(modality),
        }
    }

    /// Side-folder I/O failure
    pub fn store_io(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::StoreIo,
            format!("Schema store '{}': {}", path.into(), reason.into()),
        )
    }

    /// Dataset read failure
    pub fn dataset_io(reason: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::DatasetIo, reason)
    }

    /// Wire schema rejected by the validation primitive
    pub fn wire_schema_invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::WireSchemaInvalid,
            format!("Wire schema '{}' is invalid: {}", name.into(), reason.into()),
        )
    }

    /// Exemplar value does not fit the rule it is governed by
    pub fn exemplar_mismatch(
        field: impl Into<String>,
        modality: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let modality = modality.into();
        Self {
            code: SchemaErrorCode::ExemplarMismatch,
            message: format!("Exemplar value for '{}' rejected: {}", field, reason.into()),
            field: Some(field),
            modality: Some(modality),
        }
    }

    /// All grouping levels failed for a series
    pub fn grouping_exhausted(series: impl Into<String>, tags: &[String]) -> Self {
        Self::new(
            SchemaErrorCode::GroupingExhausted,
            format!(
                "No working grouping for series '{}' (tried up to [{}])",
                series.into(),
                tags.join(", ")
            ),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending field if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the modality if applicable
    pub fn modality(&self) -> Option<&str> {
        self.modality.as_deref()
    }

    /// Returns whether this error aborts the run
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::UnsupportedRule.code(), "SG_UNSUPPORTED_RULE");
        assert_eq!(SchemaErrorCode::GroupingExhausted.code(), "SG_GROUPING_EXHAUSTED");
        assert_eq!(SchemaErrorCode::ExemplarMismatch.code(), "SG_EXEMPLAR_MISMATCH");
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(SchemaErrorCode::UnsupportedRule.severity(), Severity::Fatal);
        assert_eq!(SchemaErrorCode::UnknownDatatype.severity(), Severity::Fatal);
        assert_eq!(SchemaErrorCode::GroupingExhausted.severity(), Severity::Recoverable);
        assert_eq!(SchemaErrorCode::ExemplarMismatch.severity(), Severity::Recoverable);
    }

    #[test]
    fn test_unsupported_rule_names_field_and_modality() {
        let err = SchemaError::unknown_datatype("pet");
        assert!(err.is_fatal());

        let err = SchemaError::unsupported_rule("EchoTime", "mri", "<>");
        assert_eq!(err.field(), Some("EchoTime"));
        assert_eq!(err.modality(), Some("mri"));
        let display = format!("{}", err);
        assert!(display.contains("EchoTime"));
        assert!(display.contains("mri"));
        assert!(display.contains("FATAL"));
    }
}
