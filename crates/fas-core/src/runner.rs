//! The pipeline runner.
//!
//! A run moves through five phases:
//!
//! 1. **Init**: read the governing study id and build the context
//! 2. **Assay phase**: join documents, groups, and specimens into assays
//! 3. **Stream phase**: run every remaining input file through the stages
//! 4. **Vocabulary flush**: emit one Observation per study
//! 5. **Reference check**: confirm every seen reference targets an emitted id
//!
//! Phases that belong to unselected stages are skipped; the phase order never
//! changes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::{debug, info, info_span};

use fas_ingest::{
    NdjsonReader, input_file, list_ndjson_files, load_research_study_id, read_resources,
    read_resources_by_id,
};
use fas_model::Resource;
use fas_output::EmitterSet;

use crate::assay::AssaySynthesizer;
use crate::context::PipelineContext;
use crate::error::Result;
use crate::stages::{Stage, StagePlan};

/// Everything a run needs, resolved before it starts.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub plan: StagePlan,
    pub seed: Option<String>,
    pub fail_fast: bool,
}

/// Counters reported when a run completes.
#[derive(Debug)]
pub struct RunSummary {
    pub research_study_id: String,
    /// Lines written per output file, keyed by resource type.
    pub emitted: BTreeMap<String, usize>,
    pub assays_synthesized: usize,
    pub vocabulary_studies: usize,
    pub ids_registered: usize,
    pub references_seen: usize,
    /// Failures accumulated when fail-fast is off.
    pub validation_errors: Vec<String>,
}

/// Drives one directory of NDJSON files through the configured stages.
pub struct PipelineRunner {
    config: RunnerConfig,
}

impl PipelineRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<RunSummary> {
        let research_study_id = load_research_study_id(&self.config.input_dir)?;
        info!(
            study = %research_study_id,
            version = %self.config.plan.version(),
            "pipeline starting"
        );

        let mut context =
            PipelineContext::new(research_study_id.clone(), self.config.plan.version())
                .with_seed(self.config.seed.clone())
                .with_fail_fast(self.config.fail_fast);
        let mut emitters = EmitterSet::create(&self.config.output_dir)?;

        match self.run_phases(&mut context, &mut emitters) {
            Ok((assays_synthesized, vocabulary_studies)) => {
                let emitted = emitters.finish()?;
                Ok(RunSummary {
                    research_study_id,
                    emitted,
                    assays_synthesized,
                    vocabulary_studies,
                    ids_registered: context.ledger.id_count(),
                    references_seen: context.ledger.reference_count(),
                    validation_errors: context.validation_errors,
                })
            }
            Err(error) => {
                // Close what was written so far; the run error wins.
                let _ = emitters.finish();
                Err(error)
            }
        }
    }

    fn run_phases(
        &self,
        context: &mut PipelineContext,
        emitters: &mut EmitterSet,
    ) -> Result<(usize, usize)> {
        let mut emitted_types = BTreeSet::new();

        let assays_synthesized = if self.config.plan.assay() {
            let span = info_span!("assay_phase");
            let _enter = span.enter();
            self.assay_phase(context, emitters, &mut emitted_types)?
        } else {
            0
        };

        {
            let span = info_span!("stream_phase");
            let _enter = span.enter();
            self.stream_phase(context, emitters, &emitted_types)?;
        }

        let vocabulary_studies = if self.config.plan.has(Stage::Vocabulary) {
            let span = info_span!("vocabulary_flush");
            let _enter = span.enter();
            flush_vocabulary(context, emitters)?
        } else {
            0
        };

        if self.config.plan.has(Stage::Validate) {
            let span = info_span!("reference_check");
            let _enter = span.enter();
            context.ledger.check_closure()?;
        }

        Ok((assays_synthesized, vocabulary_studies))
    }

    /// Join the three assay inputs, then run everything the join produced
    /// through the stages.
    fn assay_phase(
        &self,
        context: &mut PipelineContext,
        emitters: &mut EmitterSet,
        emitted_types: &mut BTreeSet<String>,
    ) -> Result<usize> {
        let documents = read_resources(&input_file(&self.config.input_dir, "DocumentReference"))?;
        let group_path = input_file(&self.config.input_dir, "Group");
        let groups = if group_path.exists() {
            read_resources(&group_path)?
        } else {
            info!("Group file not found, skipping group processing");
            Vec::new()
        };
        let specimens = read_resources_by_id(&input_file(&self.config.input_dir, "Specimen"))?;
        debug!(
            documents = documents.len(),
            groups = groups.len(),
            specimens = specimens.len(),
            "assay inputs loaded"
        );

        let output = AssaySynthesizer::new(context.version).synthesize(
            documents,
            groups,
            &specimens,
        )?;
        let assay_count = output.assay_count;
        for resource in output.resources {
            if let Some(resource) = self.config.plan.apply(resource, context)? {
                emitters.emit(&resource)?;
            }
        }
        // The source files are consumed here even when the join leaves
        // nothing behind.
        emitted_types.insert("DocumentReference".to_string());
        emitted_types.insert("Group".to_string());
        Ok(assay_count)
    }

    fn stream_phase(
        &self,
        context: &mut PipelineContext,
        emitters: &mut EmitterSet,
        emitted_types: &BTreeSet<String>,
    ) -> Result<()> {
        for file in list_ndjson_files(&self.config.input_dir)? {
            if emitted_types.contains(&file.resource_type) {
                debug!(file = %file.path.display(), "already consumed, skipping");
                continue;
            }
            for line in NdjsonReader::open(&file.path)? {
                let resource = line?;
                if self.config.plan.has(Stage::Vocabulary)
                    && is_vocabulary_observation(&resource)
                {
                    debug!("dropping pre-existing vocabulary Observation");
                    continue;
                }
                if let Some(resource) = self.config.plan.apply(resource, context)? {
                    emitters.emit(&resource)?;
                }
            }
        }
        Ok(())
    }
}

/// Emit one aggregate Observation per study seen during the run.
///
/// Flushed Observations are validated and registered even when the validate
/// stage is off; they are synthesized here, not read from input.
fn flush_vocabulary(context: &mut PipelineContext, emitters: &mut EmitterSet) -> Result<usize> {
    let collector = std::mem::take(&mut context.vocabulary);
    let study_count = collector.study_count();
    for observation in collector.flush()? {
        context.validate_and_register(&observation)?;
        emitters.emit(&observation)?;
    }
    Ok(study_count)
}

fn is_vocabulary_observation(resource: &Resource) -> bool {
    resource.resource_type() == Some("Observation")
        && resource
            .get("code")
            .and_then(|code| code.get("coding"))
            .and_then(|codings| codings.get(0))
            .and_then(|coding| coding.get("code"))
            .and_then(|code| code.as_str())
            == Some("vocabulary")
}
