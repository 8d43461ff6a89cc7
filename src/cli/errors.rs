//! CLI-specific error types
//!
//! Every CLI error ends the process with exit code 1.

use std::fmt;

use crate::dataset::DatasetError;
use crate::schema::SchemaError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Dataset root or index unusable
    DatasetError,
    /// Fatal schema error (configuration, store, rules)
    SchemaError,
    /// Some series got no schema
    GenerationIncomplete,
    /// Validation produced findings
    NotCompliant,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatasetError => "SG_CLI_DATASET_ERROR",
            Self::SchemaError => "SG_CLI_SCHEMA_ERROR",
            Self::GenerationIncomplete => "SG_CLI_GENERATION_INCOMPLETE",
            Self::NotCompliant => "SG_CLI_NOT_COMPLIANT",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Dataset error
    pub fn dataset_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::DatasetError, msg)
    }

    /// Some series failed to generate
    pub fn generation_incomplete() -> Self {
        Self::new(
            CliErrorCode::GenerationIncomplete,
            "Schema generation failed for at least one series",
        )
    }

    /// Findings were reported
    pub fn not_compliant() -> Self {
        Self::new(
            CliErrorCode::NotCompliant,
            "The dataset failed to comply to the protocol",
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, e.to_string())
    }
}

impl From<DatasetError> for CliError {
    fn from(e: DatasetError) -> Self {
        Self::dataset_error(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
