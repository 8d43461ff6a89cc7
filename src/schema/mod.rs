//! Schema subsystem for seriesguard
//!
//! Turns exemplar sidecars into typed structured schemas and back into
//! portable wire documents.
//!
//! # Design Principles
//!
//! - Rules are compiled against a single exemplar value
//! - Only configured fields are constrained; extra fields pass
//! - Output is deterministic for the same exemplar and rules
//! - Configuration bugs are fatal, exemplar conflicts are recoverable

mod errors;
mod loader;
mod metadata;
mod rules;
mod synth;
mod types;
mod validator;
mod wire;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::{
    SchemaStore, SeriesExpectation, StoredSchema, EXPECTATION_KEY, REFERENCE_SUBJECT,
    SCHEMA_FOLDER,
};
pub use metadata::{
    discriminator_value, escape_field_name, prepare_metadata, unescape_field_name,
};
pub use rules::{compile_rule, parse_rule, ParsedRule};
pub use synth::synthesize;
pub use types::{Constraint, JsonKind, ScalarSpec, SchemaNode, DISCRIMINATOR_FIELD};
pub use validator::{SeriesValidator, WireValidator, WireViolation};
pub use wire::{to_wire_schema, WIRE_SCHEMA_DIALECT};
