//! CLI argument definitions using clap
//!
//! Commands:
//! - aerosort sort [--input <path>] [--config <path>] [--limit N] [--partial]
//! - aerosort explain [--input <path>] [--config <path>] [--limit N] [--partial]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// aerosort - ORDER BY resolution and sort execution over JSON row sets
#[derive(Parser, Debug)]
#[command(name = "aerosort")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct SortArgs {
    /// Path to the input document (reads stdin if omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Row limit applied after the sort
    #[arg(long)]
    pub limit: Option<u64>,

    /// Hint that only a prefix of the sorted rows will be read
    #[arg(long)]
    pub partial: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sort the input rows and print them
    Sort {
        #[command(flatten)]
        args: SortArgs,

        /// Include a metrics snapshot in the output
        #[arg(long)]
        metrics: bool,
    },

    /// Resolve the ORDER BY clause and print the plan without sorting
    Explain {
        #[command(flatten)]
        args: SortArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
