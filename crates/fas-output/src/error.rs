use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create {path}: {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize {type_and_id}: {source}")]
    Serialize {
        type_and_id: String,
        source: fas_model::FasError,
    },
}

pub type Result<T> = std::result::Result<T, OutputError>;
