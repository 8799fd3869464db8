//! CLI argument definitions for the FHIR preparation pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use fas_core::DEFAULT_STAGE_SPEC;

#[derive(Parser)]
#[command(
    name = "fhir-prep",
    version,
    about = "FHIR Prep - Prepare study NDJSON bundles for submission",
    long_about = "Prepare a directory of FHIR NDJSON files for aggregator submission.\n\n\
                  Synthesizes assay ServiceRequests, migrates resources from R5 to R4B,\n\
                  tags them with their governing study, and aggregates study vocabularies."
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
    /// Run the preparation pipeline over a study directory.
    Prep(PrepArgs),

    /// Migrate one NDJSON file from R5 to R4B without the rest of the pipeline.
    Transform(TransformArgs),

    /// List the available pipeline stages.
    Stages,
}

#[derive(Parser)]
pub struct PrepArgs {
    /// Directory of <ResourceType>.ndjson input files.
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Directory the prepared files are written to.
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Comma-separated stage list to run.
    ///
    /// Selection is free-form but resources always flow through the selected
    /// stages in a fixed order. See `fhir-prep stages` for the catalogue.
    #[arg(
        long = "transformers",
        value_name = "LIST",
        default_value = DEFAULT_STAGE_SPEC
    )]
    pub transformers: String,

    /// Seed for the reseed stage's deterministic id rewriting.
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<String>,

    /// Record validation failures and keep processing instead of aborting.
    ///
    /// By default the pipeline stops at the first resource that fails
    /// validation. With this flag the run completes and failures are listed
    /// in the summary.
    ///
    /// WARNING: Outputs produced with this flag may not be submittable.
    #[arg(long = "no-fail-on-validation-errors")]
    pub no_fail_on_validation_errors: bool,
}

#[derive(Parser)]
pub struct TransformArgs {
    /// NDJSON file to migrate.
    #[arg(value_name = "INPUT_FILE")]
    pub input_file: PathBuf,

    /// Write migrated lines to this file instead of stdout.
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Structurally validate each migrated resource.
    #[arg(long = "validate")]
    pub validate: bool,

    /// Stop at the first failed line instead of reporting all failures.
    #[arg(long = "stop-on-first-error")]
    pub stop_on_first_error: bool,
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
