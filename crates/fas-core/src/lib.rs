//! Assay synthesis, vocabulary aggregation, and the pipeline runner.
//!
//! This crate wires the ingest, transform, validate, and output layers into
//! one run: [`StagePlan`] parses the stage selection, [`AssaySynthesizer`]
//! joins the assay inputs, [`VocabularyCollector`] aggregates study
//! vocabularies, and [`PipelineRunner`] drives the phases in order.

pub mod assay;
pub mod context;
pub mod error;
pub mod runner;
pub mod stages;
pub mod vocabulary;

pub use assay::{AssayOutput, AssaySynthesizer};
pub use context::PipelineContext;
pub use error::{CoreError, Result};
pub use runner::{PipelineRunner, RunSummary, RunnerConfig};
pub use stages::{DEFAULT_STAGE_SPEC, STAGE_CATALOGUE, Stage, StagePlan};
pub use vocabulary::VocabularyCollector;
