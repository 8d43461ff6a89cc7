//! Dataset validation against stored schemas
//!
//! Re-expands each stored schema over the dataset's subjects and sessions,
//! checks per subject/session cardinality, validates the matched sidecars
//! and reports every sidecar no schema claimed.

mod engine;
mod findings;

pub use engine::{process_validation, validate, ValidationFilter};
pub use findings::{Finding, ValidationReport};
