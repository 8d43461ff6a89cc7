//! Entity sets, queries and canonical paths

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Entities present on a file, by name
pub type EntitySet = BTreeMap<String, String>;

/// Query over entities; an empty query matches every file
pub type EntityQuery = BTreeMap<String, EntityFilter>;

/// Constraint on one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityFilter {
    /// Entity present with exactly this value
    Is(String),
    /// Entity present with one of these values
    AnyOf(Vec<String>),
    /// Entity not present
    Absent,
    /// Entity present with any value
    Present,
}

impl EntityFilter {
    /// Returns whether an entity value satisfies the filter
    pub fn accepts(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (EntityFilter::Is(expected), Some(v)) => expected == v,
            (EntityFilter::AnyOf(values), Some(v)) => values.iter().any(|x| x == v),
            (EntityFilter::Absent, None) => true,
            (EntityFilter::Present, Some(_)) => true,
            _ => false,
        }
    }
}

/// Returns whether `entities` satisfies every filter of `query`
pub fn matches(query: &EntityQuery, entities: &EntitySet) -> bool {
    query
        .iter()
        .all(|(name, filter)| filter.accepts(entities.get(name).map(String::as_str)))
}

/// Builds a query matching exactly the given entity values
pub fn exact_query(entities: &EntitySet) -> EntityQuery {
    entities
        .iter()
        .map(|(k, v)| (k.clone(), EntityFilter::Is(v.clone())))
        .collect()
}

/// Opaque handle on a dataset file: its path relative to the dataset root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(String);

impl FileRef {
    pub fn new(relpath: impl Into<String>) -> Self {
        FileRef(relpath.into())
    }

    /// Returns the relative path
    pub fn relpath(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filename entities in canonical order, with their filename keys
const ENTITY_ORDER: &[(&str, &str)] = &[
    ("subject", "sub"),
    ("session", "ses"),
    ("sample", "sample"),
    ("task", "task"),
    ("acquisition", "acq"),
    ("ceagent", "ce"),
    ("tracer", "trc"),
    ("stain", "stain"),
    ("reconstruction", "rec"),
    ("direction", "dir"),
    ("run", "run"),
    ("modality", "mod"),
    ("echo", "echo"),
    ("flip", "flip"),
    ("inversion", "inv"),
    ("mtransfer", "mt"),
    ("part", "part"),
    ("processing", "proc"),
    ("hemisphere", "hemi"),
    ("space", "space"),
    ("split", "split"),
    ("recording", "recording"),
    ("chunk", "chunk"),
    ("description", "desc"),
];

/// Entities that are not filename key-value pairs
const STRUCTURAL_ENTITIES: &[&str] = &["datatype", "suffix", "extension"];

/// Renders the canonical relative path of a file with these entities:
/// `sub-X/[ses-Y/][datatype/]sub-X[_ses-Y][_key-value...][_suffix][extension]`.
///
/// Entities missing from the ordering table follow the known ones in name
/// order so that distinct entity sets never share a path.
pub fn render_path(entities: &EntitySet) -> String {
    let mut dirs: Vec<String> = Vec::new();
    if let Some(subject) = entities.get("subject") {
        dirs.push(format!("sub-{}", subject));
    }
    if let Some(session) = entities.get("session") {
        dirs.push(format!("ses-{}", session));
    }
    if let Some(datatype) = entities.get("datatype") {
        dirs.push(datatype.clone());
    }

    let mut parts: Vec<String> = Vec::new();
    for (name, key) in ENTITY_ORDER {
        if let Some(value) = entities.get(*name) {
            parts.push(format!("{}-{}", key, value));
        }
    }
    for (name, value) in entities {
        let known = ENTITY_ORDER.iter().any(|(n, _)| n == name)
            || STRUCTURAL_ENTITIES.contains(&name.as_str());
        if !known {
            parts.push(format!("{}-{}", name, value));
        }
    }
    if let Some(suffix) = entities.get("suffix") {
        parts.push(suffix.clone());
    }

    let mut filename = parts.join("_");
    if let Some(extension) = entities.get("extension") {
        filename.push_str(extension);
    }

    dirs.push(filename);
    dirs.join("/")
}
