//! CLI module for seriesguard
//!
//! Provides command-line interface for:
//! - init: Generate schemas from exemplar sidecars
//! - validate: Check the dataset against the generated schemas

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, run_command, validate};
pub use errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}
