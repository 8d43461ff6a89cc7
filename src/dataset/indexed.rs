//! Index-backed dataset
//!
//! Holds the entries an external indexer produced for a dataset: the
//! relative path and entities of each file, optionally with its sidecar
//! contents inline. Index document layout:
//!
//! ```json
//! {
//!   "files": [
//!     {
//!       "path": "sub-01/anat/sub-01_T1w.json",
//!       "entities": {"subject": "01", "datatype": "anat", "suffix": "T1w", "extension": ".json"}
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entities::{matches, render_path, EntityQuery, EntitySet, FileRef};
use super::errors::{DatasetError, DatasetResult};
use super::Dataset;

/// Index file looked up in the dataset root by default
pub const DEFAULT_INDEX_FILE: &str = "dataset_index.json";

/// One indexed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Path relative to the dataset root
    pub path: String,
    pub entities: EntitySet,
    /// Inline sidecar contents, read from disk when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexDocument {
    files: Vec<IndexEntry>,
}

/// Dataset over a list of indexed entries
#[derive(Debug, Default)]
pub struct IndexedDataset {
    root: Option<PathBuf>,
    entries: Vec<IndexEntry>,
    positions: HashMap<FileRef, usize>,
}

impl IndexedDataset {
    /// Creates an empty in-memory dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty dataset whose sidecars are read below `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Loads `<root>/dataset_index.json`
    pub fn load(root: &Path) -> DatasetResult<Self> {
        Self::from_index_file(root, &root.join(DEFAULT_INDEX_FILE))
    }

    /// Loads an index document describing the dataset at `root`
    pub fn from_index_file(root: &Path, index_path: &Path) -> DatasetResult<Self> {
        let content = fs::read_to_string(index_path).map_err(|e| DatasetError::Io {
            path: index_path.display().to_string(),
            reason: e.to_string(),
        })?;
        let document: IndexDocument =
            serde_json::from_str(&content).map_err(|e| DatasetError::InvalidIndex {
                path: index_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut dataset = Self::with_root(root);
        for entry in document.files {
            dataset.insert_entry(entry);
        }
        Ok(dataset)
    }

    /// Writes the index document to `path`
    pub fn save_index(&self, path: &Path) -> DatasetResult<()> {
        let document = IndexDocument {
            files: self.entries.clone(),
        };
        let content =
            serde_json::to_string_pretty(&document).map_err(|e| DatasetError::InvalidIndex {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        fs::write(path, content).map_err(|e| DatasetError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Adds a file at its canonical path with inline metadata
    pub fn insert(&mut self, entities: EntitySet, metadata: Value) -> FileRef {
        let path = render_path(&entities);
        self.insert_entry(IndexEntry {
            path,
            entities,
            metadata: Some(metadata),
        })
    }

    /// Adds an entry, replacing any entry with the same path in place
    pub fn insert_entry(&mut self, entry: IndexEntry) -> FileRef {
        let file = FileRef::new(entry.path.clone());
        match self.positions.get(&file) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.positions.insert(file.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
        file
    }

    /// Returns the number of indexed files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the dataset root, if sidecars live on disk
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn entry(&self, file: &FileRef) -> Option<&IndexEntry> {
        self.positions.get(file).map(|&pos| &self.entries[pos])
    }
}

impl Dataset for IndexedDataset {
    fn query(&self, query: &EntityQuery) -> Vec<FileRef> {
        self.entries
            .iter()
            .filter(|entry| matches(query, &entry.entities))
            .map(|entry| FileRef::new(entry.path.clone()))
            .collect()
    }

    fn entities_of(&self, file: &FileRef) -> EntitySet {
        self.entry(file)
            .map(|entry| entry.entities.clone())
            .unwrap_or_default()
    }

    fn path_for(&self, entities: &EntitySet) -> String {
        render_path(entities)
    }

    fn read_json(&self, file: &FileRef) -> DatasetResult<Value> {
        let entry = self
            .entry(file)
            .ok_or_else(|| DatasetError::UnknownFile(file.to_string()))?;
        if let Some(metadata) = &entry.metadata {
            return Ok(metadata.clone());
        }

        let root = self
            .root
            .as_ref()
            .ok_or_else(|| DatasetError::NoRoot(file.to_string()))?;
        let path = root.join(&entry.path);
        let content = fs::read_to_string(&path).map_err(|e| DatasetError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| DatasetError::InvalidJson {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
