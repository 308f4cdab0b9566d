//! CLI argument definitions for baselab.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "baselab",
    version,
    about = "baselab - Build admission-window laboratory feature matrices",
    long_about = "Build one-row-per-admission laboratory feature matrices.\n\n\
                  Consolidates duplicate catalog identifiers, resolves at most one\n\
                  observation per (admission, concept) within a fixed day-offset\n\
                  window, and writes the wide matrix together with per-cell\n\
                  provenance and a machine-readable build summary."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

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
    /// Build the feature matrix and all report outputs.
    Build(BuildArgs),

    /// Audit identifier consolidation without building the matrix.
    Consolidate(ConsolidateArgs),
}

#[derive(Parser)]
pub struct BuildArgs {
    /// Path to the data folder containing the input CSV files.
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Concept catalog CSV (default: <DATA_DIR>/d_labitems_inclusion.csv).
    #[arg(long = "catalog", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Observation store CSV (default: <DATA_DIR>/labevents.csv).
    #[arg(long = "observations", value_name = "FILE")]
    pub observations: Option<PathBuf>,

    /// Encounter set CSV (default: <DATA_DIR>/admissions.csv).
    #[arg(long = "encounters", value_name = "FILE")]
    pub encounters: Option<PathBuf>,

    /// Output directory for generated files (default: <DATA_DIR>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Load, consolidate, and resolve without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ConsolidateArgs {
    /// Path to the data folder containing the input CSV files.
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Concept catalog CSV (default: <DATA_DIR>/d_labitems_inclusion.csv).
    #[arg(long = "catalog", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Observation store CSV (default: <DATA_DIR>/labevents.csv).
    #[arg(long = "observations", value_name = "FILE")]
    pub observations: Option<PathBuf>,
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
