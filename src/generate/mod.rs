//! Schema generation
//!
//! Walks the dataset series by series, groups each series' sidecars by
//! instrument and stores the resulting schema in the side folder.

mod grouping;
mod series;

pub use grouping::{build_series_schema, GroupedSchema, UNKNOWN_TAG_VALUE};
pub use series::{
    enumerate_series, excluded_entities, initialize, series_query, GenerationOptions,
    ALT_ENTITIES, SIDECAR_EXTENSION,
};
