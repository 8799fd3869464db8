use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("{context}: {message}")]
    Invalid { context: String, message: String },
    #[error("{context}: reference holds {found}, expected a string or a map")]
    BadReference { context: String, found: String },
    #[error("references not found: {}", references.join(", "))]
    DanglingReferences { references: Vec<String> },
}

pub type Result<T> = std::result::Result<T, ValidateError>;
