//! Modality configuration
//!
//! Per-modality rule trees and instrument grouping tags, loaded once per run
//! through an explicitly passed `ConfigCache`.

mod cache;
mod types;

pub use cache::{modality_for_datatype, ConfigCache};
pub use types::{InstrumentConfig, ModalityConfig, Rule, RuleTree};
