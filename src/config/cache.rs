//! Run-scoped modality configuration cache
//!
//! Configurations are loaded lazily on first use of a modality and kept for
//! the lifetime of the cache. Nothing persists across runs.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::observability::{log_event, Event};
use crate::schema::{SchemaError, SchemaResult};

use super::types::ModalityConfig;

const MRI_TAGS: &str = include_str!("../../config/mri_tags.json");
const MEEG_TAGS: &str = include_str!("../../config/meeg_tags.json");

/// Maps a datatype to its modality.
pub fn modality_for_datatype(datatype: &str) -> SchemaResult<&'static str> {
    match datatype {
        "anat" | "func" | "dwi" | "swi" | "fmap" => Ok("mri"),
        "eeg" | "meg" => Ok("meeg"),
        other => Err(SchemaError::unknown_datatype(other)),
    }
}

/// Lazily populated configuration cache
#[derive(Debug, Default)]
pub struct ConfigCache {
    /// Directory holding `<modality>_tags.json` overrides
    override_dir: Option<PathBuf>,
    configs: HashMap<String, ModalityConfig>,
}

impl ConfigCache {
    /// Creates a cache backed by the built-in configurations
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache reading `<dir>/<modality>_tags.json` instead of the
    /// built-in configurations
    pub fn with_override_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
            configs: HashMap::new(),
        }
    }

    /// Installs a configuration for a modality, replacing any cached one
    pub fn insert(&mut self, config: ModalityConfig) {
        self.configs.insert(config.modality.clone(), config);
    }

    /// Returns the configuration governing a datatype
    pub fn for_datatype(&mut self, datatype: &str) -> SchemaResult<&ModalityConfig> {
        let modality = modality_for_datatype(datatype)?;
        self.for_modality(modality)
    }

    /// Returns the configuration of a modality, loading it on first access
    pub fn for_modality(&mut self, modality: &str) -> SchemaResult<&ModalityConfig> {
        if !self.configs.contains_key(modality) {
            let config = self.load(modality)?;
            log_event(Event::ConfigLoaded, &[("modality", modality)]);
            self.configs.insert(modality.to_string(), config);
        }
        Ok(&self.configs[modality])
    }

    /// Returns the number of cached configurations
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Returns whether nothing has been loaded yet
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    fn load(&self, modality: &str) -> SchemaResult<ModalityConfig> {
        match &self.override_dir {
            Some(dir) => {
                let path = dir.join(format!("{}_tags.json", modality));
                let text = fs::read_to_string(&path).map_err(|e| {
                    SchemaError::config_invalid(
                        modality,
                        format!("Failed to read {}: {}", path.display(), e),
                    )
                })?;
                ModalityConfig::from_json_str(modality, &text)
            }
            None => {
                let text = match modality {
                    "mri" => MRI_TAGS,
                    "meeg" => MEEG_TAGS,
                    other => {
                        return Err(SchemaError::config_invalid(other, "no built-in configuration"))
                    }
                };
                ModalityConfig::from_json_str(modality, text)
            }
        }
    }
}
