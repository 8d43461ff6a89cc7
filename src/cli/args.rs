//! CLI argument definitions using clap
//!
//! Commands:
//! - seriesguard init <dataset>
//! - seriesguard validate <dataset>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// seriesguard - infer protocol schemas from exemplar sidecars and check compliance
#[derive(Parser, Debug)]
#[command(name = "seriesguard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate schemas from the dataset's exemplar sidecars
    Init {
        /// Path to the dataset root
        dataset: PathBuf,

        /// Dataset index file (default: <dataset>/dataset_index.json)
        #[arg(long)]
        index: Option<PathBuf>,

        /// Directory with <modality>_tags.json overrides
        #[arg(long)]
        config_dir: Option<PathBuf>,

        /// Keep sessions apart instead of factoring them out
        #[arg(long)]
        varying_sessions: bool,

        /// Allow schemas specific to a scanner instance
        #[arg(long)]
        scanner_specific: bool,

        /// Allow schemas specific to the scanner software version
        #[arg(long)]
        version_specific: bool,

        /// Log at TRACE level
        #[arg(long)]
        debug: bool,
    },

    /// Validate the dataset against its generated schemas
    Validate {
        /// Path to the dataset root
        dataset: PathBuf,

        /// Dataset index file (default: <dataset>/dataset_index.json)
        #[arg(long)]
        index: Option<PathBuf>,

        /// Subjects to validate (default: all)
        #[arg(long, num_args = 1..)]
        participant_label: Vec<String>,

        /// Sessions to validate (default: all)
        #[arg(long, num_args = 1..)]
        session_label: Vec<String>,

        /// Log at TRACE level
        #[arg(long)]
        debug: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
