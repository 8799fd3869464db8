//! Stage selection and per-resource application order.
//!
//! A run is configured with a comma-separated stage list, but selection and
//! order are independent: whatever order the operator writes, resources flow
//! through the selected stages in a fixed sequence.
//!
//! | Order | Stage        | Effect                                            |
//! |-------|--------------|---------------------------------------------------|
//! | 1     | `part-of`    | Tag the resource with the part-of-study extension |
//! | 2     | `r4`         | Migrate the resource from R5 to R4B               |
//! | 3     | `validate`   | Structural validation plus ledger registration    |
//! | 4     | `reseed`     | Deterministic uuid5 rewrite of ids and references |
//! | 5     | `vocabulary` | Tally codings and extensions for the flush        |
//!
//! `assay` is not a per-resource stage: it is a whole-run phase that joins
//! DocumentReference, Group, and Specimen files before streaming begins, so
//! [`StagePlan`] records it as a flag rather than a [`Stage`].

use fas_model::{FhirVersion, Resource};
use fas_transform::{apply_part_of, migrate, reseed};

use crate::context::PipelineContext;
use crate::error::{CoreError, Result};

/// Stage list used when the operator does not pass one.
pub const DEFAULT_STAGE_SPEC: &str = "assay,r4,part-of,vocabulary,validate";

/// Stage names and one-line descriptions, for `--help`-style listings.
pub const STAGE_CATALOGUE: &[(&str, &str)] = &[
    (
        "assay",
        "synthesize ServiceRequest assays joining documents, groups, and specimens",
    ),
    (
        "part-of",
        "tag every resource with the part-of-study extension",
    ),
    ("r4", "migrate resources from R5 to the R4B schema"),
    (
        "validate",
        "validate structure and check reference closure at the end of the run",
    ),
    ("reseed", "rewrite ids and references deterministically from a seed"),
    (
        "vocabulary",
        "aggregate codings and extension values into per-study Observations",
    ),
];

/// A per-resource pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PartOf,
    R4,
    Validate,
    Reseed,
    Vocabulary,
}

/// Fixed order stages run in, regardless of the configured order.
const APPLICATION_ORDER: [Stage; 5] = [
    Stage::PartOf,
    Stage::R4,
    Stage::Validate,
    Stage::Reseed,
    Stage::Vocabulary,
];

impl Stage {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "part-of" => Some(Self::PartOf),
            "r4" => Some(Self::R4),
            // "validate_references" is a historical alias kept for older run
            // scripts.
            "validate" | "validate_references" => Some(Self::Validate),
            "reseed" => Some(Self::Reseed),
            "vocabulary" => Some(Self::Vocabulary),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PartOf => "part-of",
            Self::R4 => "r4",
            Self::Validate => "validate",
            Self::Reseed => "reseed",
            Self::Vocabulary => "vocabulary",
        }
    }
}

/// Parsed stage selection for one run.
#[derive(Debug, Clone)]
pub struct StagePlan {
    assay: bool,
    stages: Vec<Stage>,
}

impl StagePlan {
    /// Parse a comma-separated stage list.
    ///
    /// Unknown names are collected and reported together. Selecting `reseed`
    /// without a seed is rejected up front rather than midway through a run.
    pub fn parse(spec: &str, seed: Option<&str>) -> Result<Self> {
        let mut assay = false;
        let mut requested = Vec::new();
        let mut unknown = Vec::new();
        for name in spec.split(',') {
            if name == "assay" {
                assay = true;
            } else if let Some(stage) = Stage::from_name(name) {
                if !requested.contains(&stage) {
                    requested.push(stage);
                }
            } else {
                unknown.push(name.to_string());
            }
        }
        if !unknown.is_empty() {
            unknown.sort();
            unknown.dedup();
            return Err(CoreError::UnknownStages { names: unknown });
        }
        if requested.contains(&Stage::Reseed) && seed.is_none() {
            return Err(CoreError::SeedRequired);
        }
        let stages = APPLICATION_ORDER
            .into_iter()
            .filter(|stage| requested.contains(stage))
            .collect();
        Ok(Self { assay, stages })
    }

    /// Whether the assay synthesis phase runs before streaming.
    pub fn assay(&self) -> bool {
        self.assay
    }

    pub fn has(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// Selected per-resource stages, in application order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Schema version the run emits: R4B when migrating, R5 otherwise.
    pub fn version(&self) -> FhirVersion {
        if self.has(Stage::R4) {
            FhirVersion::R4B
        } else {
            FhirVersion::R5
        }
    }

    /// Run one resource through the selected stages in application order.
    ///
    /// Returns `Ok(None)` when a stage drops the resource, as the migration
    /// does for specimen-subject DocumentReferences.
    pub fn apply(
        &self,
        mut resource: Resource,
        context: &mut PipelineContext,
    ) -> Result<Option<Resource>> {
        for stage in &self.stages {
            match stage {
                Stage::PartOf => apply_part_of(&mut resource, &context.research_study_id),
                Stage::R4 => match migrate(resource)? {
                    Some(migrated) => resource = migrated,
                    None => return Ok(None),
                },
                Stage::Validate => context.validate_and_register(&resource)?,
                Stage::Reseed => {
                    let seed = context.seed.as_deref().ok_or(CoreError::SeedRequired)?;
                    reseed(&mut resource, seed)?;
                }
                Stage::Vocabulary => context.vocabulary.collect(&resource)?,
            }
        }
        Ok(Some(resource))
    }
}
