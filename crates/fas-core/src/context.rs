//! Shared state threaded through stage application.
//!
//! The [`PipelineContext`] bundles everything a stage may need while one
//! resource flows through the chain:
//!
//! - **Study metadata**: `research_study_id` identifying the governing study
//! - **Target version**: the schema the run emits ([`FhirVersion`])
//! - **Reseed input**: the optional seed for deterministic id rewriting
//! - **Ledger**: emitted ids and seen references for the closure check
//! - **Vocabulary**: per-study histogram aggregates awaiting the flush
//!
//! Stages receive the context by mutable reference; nothing here is global.

use tracing::warn;

use fas_model::{FhirVersion, Resource};
use fas_validate::{ReferenceLedger, StructuralValidator, Validator};

use crate::error::Result;
use crate::vocabulary::VocabularyCollector;

/// Centralized mutable state for one pipeline run.
pub struct PipelineContext {
    /// Governing study id, read from `ResearchStudy.ndjson`.
    pub research_study_id: String,
    /// Schema version resources are validated against.
    pub version: FhirVersion,
    /// Seed for the reseed stage, when configured.
    pub seed: Option<String>,
    /// Abort on the first validation failure instead of accumulating.
    pub fail_fast: bool,
    /// Validation seam; structural checking by default.
    pub validator: Box<dyn Validator>,
    /// Emitted ids and seen references.
    pub ledger: ReferenceLedger,
    /// Per-study vocabulary aggregates.
    pub vocabulary: VocabularyCollector,
    /// Failures recorded when `fail_fast` is off.
    pub validation_errors: Vec<String>,
}

impl PipelineContext {
    pub fn new(research_study_id: impl Into<String>, version: FhirVersion) -> Self {
        Self {
            research_study_id: research_study_id.into(),
            version,
            seed: None,
            fail_fast: true,
            validator: Box::new(StructuralValidator),
            ledger: ReferenceLedger::new(),
            vocabulary: VocabularyCollector::new(),
            validation_errors: Vec::new(),
        }
    }

    /// Sets the reseed seed.
    pub fn with_seed(mut self, seed: Option<String>) -> Self {
        self.seed = seed;
        self
    }

    /// Sets whether a validation failure aborts the run.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Replaces the structural validator with a schema-aware one.
    pub fn with_validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    /// Validate one resource and record its id and references in the ledger.
    ///
    /// With `fail_fast` off, a validation failure is recorded and the
    /// resource skips ledger registration but keeps flowing.
    pub fn validate_and_register(&mut self, resource: &Resource) -> Result<()> {
        match self.validator.validate(resource, self.version) {
            Ok(()) => {
                self.ledger.register(resource)?;
                Ok(())
            }
            Err(error) if self.fail_fast => Err(error.into()),
            Err(error) => {
                warn!(%error, "validation failure recorded");
                self.validation_errors.push(error.to_string());
                Ok(())
            }
        }
    }
}
