//! Observable events for seriesguard
//!
//! Events are explicit and typed; their string names are stable.

use std::fmt;

/// Observable events during schema generation and validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Modality configuration loaded into the run cache
    ConfigLoaded,

    // Generation
    /// Generation over the whole dataset begins
    GenerationBegin,
    /// A datatype is being processed
    DatatypeBegin,
    /// A series is being processed
    SeriesBegin,
    /// Schema synthesized from an exemplar
    ExemplarSynthesized,
    /// A grouping level could not reconcile its partitions
    GroupingRejected,
    /// A grouping level succeeded
    GroupingAccepted,
    /// Generated schema written to the side folder
    SchemaWritten,
    /// No grouping level worked for a series
    SeriesFailed,
    /// Generation over the whole dataset complete
    GenerationComplete,

    // Validation
    /// Validation begins
    ValidationBegin,
    /// Generated schemas loaded from the side folder
    SchemasLoaded,
    /// One stored schema is being checked against the dataset
    ExpectationBegin,
    /// A subject/session pair is being checked
    SubjectSessionBegin,
    /// A sidecar is being validated
    SidecarValidated,
    /// A validation finding
    Finding,
    /// A sidecar was claimed by more than one expectation
    DoubleClaim,
    /// Validation complete
    ValidationComplete,

    // Metadata
    /// A sidecar has both a reserved field name and its escaped form
    FieldNameCollision,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::GenerationBegin => "GENERATION_BEGIN",
            Event::DatatypeBegin => "DATATYPE_BEGIN",
            Event::SeriesBegin => "SERIES_BEGIN",
            Event::ExemplarSynthesized => "EXEMPLAR_SYNTHESIZED",
            Event::GroupingRejected => "GROUPING_REJECTED",
            Event::GroupingAccepted => "GROUPING_ACCEPTED",
            Event::SchemaWritten => "SCHEMA_WRITTEN",
            Event::SeriesFailed => "SERIES_FAILED",
            Event::GenerationComplete => "GENERATION_COMPLETE",

            Event::ValidationBegin => "VALIDATION_BEGIN",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::ExpectationBegin => "EXPECTATION_BEGIN",
            Event::SubjectSessionBegin => "SUBJECT_SESSION_BEGIN",
            Event::SidecarValidated => "SIDECAR_VALIDATED",
            Event::Finding => "FINDING",
            Event::DoubleClaim => "DOUBLE_CLAIM",
            Event::ValidationComplete => "VALIDATION_COMPLETE",
            Event::FieldNameCollision => "FIELD_NAME_COLLISION",
        }
    }

    /// Returns true if this event reports a problem
    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            Event::SeriesFailed | Event::Finding | Event::DoubleClaim
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
