//! seriesguard - schema inference and protocol compliance for entity-tagged datasets
//!
//! Generates per-series metadata schemas from exemplar sidecars, grouping by
//! instrument when exemplars disagree, then validates a whole dataset
//! against them with per subject/session cardinality checks.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod generate;
pub mod observability;
pub mod schema;
pub mod validate;
