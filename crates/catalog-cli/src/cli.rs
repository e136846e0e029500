//! CLI argument definitions for the catalog validator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "catalog",
    version,
    about = "Validate and clean an academic course catalog",
    long_about = "Validate and clean an academic course catalog.\n\n\
                  Reads the catalog datasets, drops curriculum offerings whose\n\
                  prerequisites cannot be met, validates every dataset and\n\
                  writes the cleaned datasets."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate every dataset and store the cleaned output.
    Run(RunArgs),

    /// List the catalog datasets and their columns.
    Datasets,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Configuration file (default: ./catalog.toml when present).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the input CSV files.
    #[arg(long = "input-dir", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory the cleaned CSV files are written to.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Validate without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Number of prerequisite closure passes.
    #[arg(long = "closure-depth", value_name = "N")]
    pub closure_depth: Option<usize>,

    /// Fail instead of warning when prerequisite chains outlast the closure depth.
    #[arg(long = "fail-on-unresolved")]
    pub fail_on_unresolved: bool,

    /// Format of primary-key columns.
    #[arg(long = "identifier-format", value_enum)]
    pub identifier_format: Option<IdentifierFormatArg>,

    /// Print the run summary as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum IdentifierFormatArg {
    Token,
    Uuid,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
