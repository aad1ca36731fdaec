//! CLI argument definitions for the rules engine driver.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "rules",
    version,
    about = "Evaluate rule operations against clinical datasets",
    long_about = "Evaluate a single named operation against a local CSV dataset.\n\n\
                  Library metadata is read through the configured cache, falling back\n\
                  to JSON files under the library directory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
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
    /// List the registered operations.
    Operations,

    /// Evaluate one operation against a dataset.
    Evaluate(EvaluateArgs),
}

#[derive(Parser)]
pub struct EvaluateArgs {
    /// Dataset to evaluate against (CSV).
    #[arg(long = "dataset", value_name = "PATH")]
    pub dataset: PathBuf,

    /// Registered operation name (see `rules operations`).
    #[arg(long = "operation", value_name = "NAME")]
    pub operation: String,

    /// Key the result is reported under.
    #[arg(long = "operation-id", value_name = "ID", default_value = "$result")]
    pub operation_id: String,

    /// Domain of the dataset (e.g. AE).
    #[arg(long = "domain")]
    pub domain: Option<String>,

    /// Standard identifier (e.g. sdtmig).
    #[arg(long = "standard")]
    pub standard: Option<String>,

    /// Standard version (e.g. 3-4).
    #[arg(long = "standard-version", value_name = "VERSION")]
    pub standard_version: Option<String>,

    /// Column the operation reads.
    #[arg(long = "target", value_name = "COLUMN")]
    pub target: Option<String>,

    /// Grouping column; repeat for several.
    #[arg(long = "group-by", value_name = "COLUMN")]
    pub group_by: Vec<String>,

    /// Row filter condition; repeat to combine with AND.
    #[arg(long = "filter", value_name = "COLUMN=VALUE")]
    pub filter: Vec<String>,

    /// Study manifest: a JSON array of {"filename", "domain"} entries.
    #[arg(long = "manifest", value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Domains for cross-dataset operations; repeat for several.
    #[arg(long = "target-domain", value_name = "DOMAIN")]
    pub target_domains: Vec<String>,

    /// Column holding controlled-terminology codes (TSVALCD).
    #[arg(long = "ct-attribute", value_name = "COLUMN")]
    pub ct_attribute: Option<String>,

    /// Column holding the CT version of each code (TSVCDVER).
    #[arg(long = "ct-version", value_name = "COLUMN")]
    pub ct_version: Option<String>,

    /// CT package JSON file to load; repeat for several.
    #[arg(long = "ct-package", value_name = "FILE")]
    pub ct_packages: Vec<PathBuf>,

    /// Directory with library metadata ({standard}/{version}/model.json).
    #[arg(long = "library", value_name = "DIR")]
    pub library: Option<PathBuf>,

    /// Engine configuration file (TOML).
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Scan the dataset lazily.
    #[arg(long = "lazy")]
    pub lazy: bool,

    /// Print one JSON value per row instead of a table.
    #[arg(long = "json")]
    pub json: bool,

    /// Maximum rows shown in the table preview.
    #[arg(long = "limit", default_value_t = 20)]
    pub limit: usize,
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
