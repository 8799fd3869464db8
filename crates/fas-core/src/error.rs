use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown stages: {}", names.join(", "))]
    UnknownStages { names: Vec<String> },
    #[error("reseed requested without a seed")]
    SeedRequired,
    #[error("Group/{group_id} does not reference a ResearchStudy")]
    GroupWithoutStudy { group_id: String },
    #[error("Specimen/{specimen_id} referenced by DocumentReference/{document_id} was not found")]
    SpecimenNotFound {
        specimen_id: String,
        document_id: String,
    },
    #[error("{context}: resource has no part-of-study extension")]
    MissingPartOfStudy { context: String },
    #[error("assay join out of balance: {summary}")]
    UnbalancedAssayJoin { summary: String },
    #[error("{context}: {message}")]
    MalformedResource { context: String, message: String },
    #[error(transparent)]
    Ingest(#[from] fas_ingest::IngestError),
    #[error(transparent)]
    Output(#[from] fas_output::OutputError),
    #[error(transparent)]
    Transform(#[from] fas_transform::TransformError),
    #[error(transparent)]
    Validate(#[from] fas_validate::ValidateError),
    #[error(transparent)]
    Model(#[from] fas_model::FasError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
