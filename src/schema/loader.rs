//! Side-folder schema store
//!
//! Generated schemas live under `<dataset>/.forbids/`, one JSON file per
//! series, at the path the dataset would give a file with the series
//! entities and the placeholder subject `ref`:
//! - The document is the wire schema plus a `series` block
//! - Files are written pretty-printed with sorted keys
//! - Regenerating a series overwrites its file

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use walkdir::WalkDir;

use super::errors::{SchemaError, SchemaResult};

/// Name of the side folder inside the dataset root
pub const SCHEMA_FOLDER: &str = ".forbids";

/// Key of the expectation block inside a stored document
pub const EXPECTATION_KEY: &str = "series";

/// Placeholder subject used in stored schema paths
pub const REFERENCE_SUBJECT: &str = "ref";

/// Per subject/session expectations attached to a stored schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesExpectation {
    /// Entities the schema governs, without subject
    #[serde(default)]
    pub entities: BTreeMap<String, String>,

    /// Sidecar fields forming the discriminator
    #[serde(default)]
    pub instrument_tags: Vec<String>,

    /// Whether a subject/session may have no file at all
    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub min_runs: u32,

    #[serde(default = "unbounded_runs")]
    pub max_runs: u32,
}

fn unbounded_runs() -> u32 {
    u32::MAX
}

impl SeriesExpectation {
    /// Expectation of exactly one file per subject/session
    pub fn single(entities: BTreeMap<String, String>, instrument_tags: Vec<String>) -> Self {
        Self {
            entities,
            instrument_tags,
            optional: false,
            min_runs: 1,
            max_runs: 1,
        }
    }

    /// Returns the session this schema is pinned to, if any
    pub fn session(&self) -> Option<&str> {
        self.entities.get("session").map(String::as_str)
    }
}

/// A schema read back from the side folder
#[derive(Debug, Clone)]
pub struct StoredSchema {
    /// Path relative to the side folder, `/` separated
    pub relpath: String,
    pub expectation: SeriesExpectation,
    /// Wire schema with the expectation block removed
    pub document: Value,
}

/// Reads and writes the side folder of one dataset
pub struct SchemaStore {
    folder: PathBuf,
}

impl SchemaStore {
    /// Creates a store for the dataset rooted at `dataset_root`.
    pub fn new(dataset_root: &Path) -> Self {
        Self {
            folder: dataset_root.join(SCHEMA_FOLDER),
        }
    }

    /// Returns the side folder path.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Writes one series schema, creating parent directories.
    ///
    /// Returns the absolute path written.
    pub fn write(
        &self,
        relpath: &str,
        wire: &Value,
        expectation: &SeriesExpectation,
    ) -> SchemaResult<PathBuf> {
        let path = self.folder.join(relpath);

        let mut document = wire.clone();
        let block = serde_json::to_value(expectation)
            .map_err(|e| SchemaError::store_io(relpath, format!("Failed to serialize: {}", e)))?;
        match &mut document {
            Value::Object(obj) => {
                obj.insert(EXPECTATION_KEY.to_string(), block);
            }
            _ => {
                return Err(SchemaError::store_io(relpath, "wire schema is not an object"));
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SchemaError::store_io(
                    parent.display().to_string(),
                    format!("Failed to create directory: {}", e),
                )
            })?;
        }

        let mut content = serde_json::to_string_pretty(&sorted(document)).map_err(|e| {
            SchemaError::store_io(relpath, format!("Failed to serialize: {}", e))
        })?;
        content.push('\n');

        fs::write(&path, content).map_err(|e| {
            SchemaError::store_io(
                path.display().to_string(),
                format!("Failed to write file: {}", e),
            )
        })?;

        Ok(path)
    }

    /// Loads every stored schema, in path order.
    ///
    /// A missing side folder yields no schemas. Unreadable or malformed
    /// documents are fatal.
    pub fn load_all(&self) -> SchemaResult<Vec<StoredSchema>> {
        if !self.folder.is_dir() {
            return Ok(Vec::new());
        }

        let mut schemas = Vec::new();
        for entry in WalkDir::new(&self.folder).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                SchemaError::store_io(
                    self.folder.display().to_string(),
                    format!("Failed to walk directory: {}", e),
                )
            })?;

            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            schemas.push(self.load_file(path)?);
        }

        Ok(schemas)
    }

    fn load_file(&self, path: &Path) -> SchemaResult<StoredSchema> {
        let relpath = path
            .strip_prefix(&self.folder)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::store_io(&relpath, format!("Failed to read file: {}", e))
        })?;

        let mut document: Value = serde_json::from_str(&content)
            .map_err(|e| SchemaError::store_io(&relpath, format!("Invalid JSON: {}", e)))?;

        let block = document
            .as_object_mut()
            .and_then(|obj| obj.remove(EXPECTATION_KEY))
            .ok_or_else(|| {
                SchemaError::store_io(&relpath, format!("missing '{}' block", EXPECTATION_KEY))
            })?;

        let expectation: SeriesExpectation = serde_json::from_value(block).map_err(|e| {
            SchemaError::store_io(&relpath, format!("Invalid '{}' block: {}", EXPECTATION_KEY, e))
        })?;

        Ok(StoredSchema {
            relpath,
            expectation,
            document,
        })
    }
}

/// Rebuilds objects with their keys in sorted order
fn sorted(value: Value) -> Value {
    match value {
        Value::Object(obj) => {
            let ordered: BTreeMap<String, Value> =
                obj.into_iter().map(|(k, v)| (k, sorted(v))).collect();
            Value::Object(ordered.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
