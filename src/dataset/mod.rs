//! Dataset access
//!
//! The engine only sees a dataset through the `Dataset` trait: entity
//! queries over its files, the entities of a file, canonical paths and
//! sidecar contents. Parsing entity-tagged filenames is left to whatever
//! indexer produced the dataset's entries.

mod entities;
mod errors;
mod indexed;

use std::collections::BTreeSet;

use serde_json::Value;

pub use entities::{
    exact_query, matches, render_path, EntityFilter, EntityQuery, EntitySet, FileRef,
};
pub use errors::{DatasetError, DatasetResult};
pub use indexed::{IndexEntry, IndexedDataset, DEFAULT_INDEX_FILE};

/// Read access to an entity-tagged dataset
pub trait Dataset {
    /// Returns the files matching `query`, in the dataset's natural order.
    fn query(&self, query: &EntityQuery) -> Vec<FileRef>;

    /// Returns the entities of a file; empty for unknown files.
    fn entities_of(&self, file: &FileRef) -> EntitySet;

    /// Returns the canonical relative path of a file with these entities.
    fn path_for(&self, entities: &EntitySet) -> String;

    /// Reads a JSON sidecar.
    fn read_json(&self, file: &FileRef) -> DatasetResult<Value>;

    /// Distinct datatypes, sorted
    fn datatypes(&self) -> Vec<String> {
        self.distinct("datatype", &EntityQuery::new())
    }

    /// Distinct subjects, sorted, restricted to `filter` when given
    fn subjects(&self, filter: Option<&[String]>) -> Vec<String> {
        let mut query = EntityQuery::new();
        if let Some(labels) = filter {
            query.insert("subject".into(), EntityFilter::AnyOf(labels.to_vec()));
        }
        self.distinct("subject", &query)
    }

    /// Distinct sessions of a subject, sorted, restricted to `filter` when given
    fn sessions(&self, subject: &str, filter: Option<&[String]>) -> Vec<String> {
        let mut query = EntityQuery::new();
        query.insert("subject".into(), EntityFilter::Is(subject.to_string()));
        if let Some(labels) = filter {
            query.insert("session".into(), EntityFilter::AnyOf(labels.to_vec()));
        }
        self.distinct("session", &query)
    }

    /// Distinct values of `entity` over the files matching `query`, sorted
    fn distinct(&self, entity: &str, query: &EntityQuery) -> Vec<String> {
        self.query(query)
            .iter()
            .filter_map(|file| self.entities_of(file).remove(entity))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
