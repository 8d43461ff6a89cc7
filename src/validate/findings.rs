//! Validation findings
//!
//! Findings are data, not errors: they are accumulated in discovery order
//! and never stop a validation run.

use std::fmt;

use serde_json::Value;

use crate::dataset::FileRef;

/// One problem found while validating a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    /// A sidecar field fails its constraint
    SchemaViolation {
        file: FileRef,
        /// Dotted field path, empty for the whole document
        location: String,
        message: String,
        value: Value,
    },
    /// Fewer files than expected for a subject/session
    MissingFile { expected: String, message: String },
    /// More files than allowed for a subject/session
    CardinalityExceeded {
        expected: String,
        found: usize,
        max_runs: u32,
    },
    /// A sidecar no stored schema claimed
    UnexpectedFile { file: FileRef },
}

impl Finding {
    /// Returns the finding kind name
    pub fn kind(&self) -> &'static str {
        match self {
            Finding::SchemaViolation { .. } => "SchemaViolation",
            Finding::MissingFile { .. } => "MissingFile",
            Finding::CardinalityExceeded { .. } => "CardinalityExceeded",
            Finding::UnexpectedFile { .. } => "UnexpectedFile",
        }
    }

    /// Returns the dataset path the finding is about
    pub fn path(&self) -> &str {
        match self {
            Finding::SchemaViolation { file, .. } | Finding::UnexpectedFile { file } => file.relpath(),
            Finding::MissingFile { expected, .. }
            | Finding::CardinalityExceeded { expected, .. } => expected,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::SchemaViolation {
                file,
                location,
                message,
                value,
            } => write!(f, "{} {} {} : {} found {}", self.kind(), file, location, message, value),
            Finding::MissingFile { expected, message } => {
                write!(f, "{} {} : {}", self.kind(), expected, message)
            }
            Finding::CardinalityExceeded {
                expected,
                found,
                max_runs,
            } => write!(
                f,
                "{} {} : expected at most {} runs, found {}",
                self.kind(),
                expected,
                max_runs,
                found
            ),
            Finding::UnexpectedFile { file } => write!(f, "{} {}", self.kind(), file),
        }
    }
}

/// Outcome of one validation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Findings in discovery order
    pub findings: Vec<Finding>,
    /// Files claimed by some expectation, in claim order
    pub claimed: Vec<FileRef>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Returns true when nothing was found
    pub fn is_compliant(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns the findings of one kind
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.kind() == kind)
    }
}
