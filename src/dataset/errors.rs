//! # Dataset Errors

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Dataset access errors
#[derive(Debug, Clone, Error)]
pub enum DatasetError {
    #[error("Unknown file: {0}")]
    UnknownFile(String),

    #[error("No dataset root to read {0} from")]
    NoRoot(String),

    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid JSON in {path}: {reason}")]
    InvalidJson { path: String, reason: String },

    #[error("Invalid index {path}: {reason}")]
    InvalidIndex { path: String, reason: String },
}

impl From<DatasetError> for SchemaError {
    fn from(err: DatasetError) -> Self {
        SchemaError::dataset_io(err.to_string())
    }
}
