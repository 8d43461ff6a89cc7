//! CLI command implementations
//!
//! Both commands read the dataset through its index, then hand over to the
//! generation or validation engine. A run that leaves a series without a
//! schema, or a dataset with findings, is reported as an error.

use std::path::{Path, PathBuf};

use crate::config::ConfigCache;
use crate::dataset::{IndexedDataset, DEFAULT_INDEX_FILE};
use crate::generate::{initialize, GenerationOptions};
use crate::observability::init_verbosity;
use crate::schema::SchemaStore;
use crate::validate::{process_validation, ValidationFilter};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Dispatch a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init {
            dataset,
            index,
            config_dir,
            varying_sessions,
            scanner_specific,
            version_specific,
            debug,
        } => {
            init_verbosity(debug);
            let options = GenerationOptions {
                uniform_instruments: !scanner_specific,
                uniform_sessions: !varying_sessions,
                version_specific,
            };
            init(&dataset, index.as_deref(), config_dir, &options)
        }
        Command::Validate {
            dataset,
            index,
            participant_label,
            session_label,
            debug,
        } => {
            init_verbosity(debug);
            let filter = ValidationFilter {
                subjects: labels(participant_label),
                sessions: labels(session_label),
            };
            validate(&dataset, index.as_deref(), &filter)
        }
    }
}

/// Generate and store schemas for every series of the dataset
pub fn init(
    dataset_root: &Path,
    index: Option<&Path>,
    config_dir: Option<PathBuf>,
    options: &GenerationOptions,
) -> CliResult<()> {
    let dataset = load_dataset(dataset_root, index)?;
    let store = SchemaStore::new(dataset_root);
    let mut configs = match config_dir {
        Some(dir) => ConfigCache::with_override_dir(dir),
        None => ConfigCache::new(),
    };

    if initialize(&dataset, &store, &mut configs, options)? {
        Ok(())
    } else {
        Err(CliError::generation_incomplete())
    }
}

/// Validate the dataset against its stored schemas
pub fn validate(dataset_root: &Path, index: Option<&Path>, filter: &ValidationFilter) -> CliResult<()> {
    let dataset = load_dataset(dataset_root, index)?;
    let store = SchemaStore::new(dataset_root);

    if process_validation(&dataset, &store, filter)? {
        Ok(())
    } else {
        Err(CliError::not_compliant())
    }
}

fn load_dataset(root: &Path, index: Option<&Path>) -> CliResult<IndexedDataset> {
    if !root.is_dir() {
        return Err(CliError::dataset_error(format!(
            "Dataset root {} is not a directory",
            root.display()
        )));
    }
    let index_path = match index {
        Some(path) => path.to_path_buf(),
        None => root.join(DEFAULT_INDEX_FILE),
    };
    Ok(IndexedDataset::from_index_file(root, &index_path)?)
}

fn labels(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use crate::dataset::{EntitySet, IndexEntry};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_dataset(root: &Path, echo_times: &[(&str, f64)]) {
        let mut dataset = IndexedDataset::with_root(root);
        for (subject, echo_time) in echo_times {
            let relpath = format!("sub-{0}/anat/sub-{0}_T1w.json", subject);
            fs::create_dir_all(root.join(format!("sub-{}/anat", subject))).unwrap();
            fs::write(
                root.join(&relpath),
                json!({"Manufacturer": "Siemens", "EchoTime": echo_time}).to_string(),
            )
            .unwrap();

            let entities: EntitySet = [
                ("subject", *subject),
                ("datatype", "anat"),
                ("suffix", "T1w"),
                ("extension", ".json"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
            dataset.insert_entry(IndexEntry {
                path: relpath,
                entities,
                metadata: None,
            });
        }
        dataset.save_index(&root.join(DEFAULT_INDEX_FILE)).unwrap();
    }

    #[test]
    fn test_init_then_validate() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_dataset(root, &[("01", 0.003), ("02", 0.003)]);

        init(root, None, None, &GenerationOptions::default()).unwrap();
        assert!(root.join(".forbids/sub-ref/anat/sub-ref_T1w.json").is_file());

        validate(root, None, &ValidationFilter::default()).unwrap();
    }

    #[test]
    fn test_validate_reports_non_compliance() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_dataset(root, &[("01", 0.003), ("02", 0.003)]);
        init(root, None, None, &GenerationOptions::default()).unwrap();

        write_dataset(root, &[("01", 0.003), ("02", 0.010)]);
        let err = validate(root, None, &ValidationFilter::default()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::NotCompliant);

        let only_first = ValidationFilter {
            subjects: Some(vec!["01".into()]),
            sessions: None,
        };
        validate(root, None, &only_first).unwrap();
    }

    #[test]
    fn test_missing_root_or_index() {
        let temp_dir = TempDir::new().unwrap();
        let err = validate(&temp_dir.path().join("nope"), None, &ValidationFilter::default())
            .unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::DatasetError);

        let err = init(temp_dir.path(), None, None, &GenerationOptions::default()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::DatasetError);
    }
}
