//! Command-line interface for aerosort
//!
//! Provides:
//! - sort: resolve ORDER BY and print the sorted rows
//! - explain: resolve ORDER BY and print the plan

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, SortArgs};
pub use commands::{
    explain, explain_document, load_config, run, run_command, sort, sort_document, RenderSpec,
    SortDocument, SortOptions,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_document, write_error, write_response};
