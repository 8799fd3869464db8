use thiserror::Error;

use fas_model::Resource;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{context}: {message}")]
    UnexpectedShape { context: String, message: String },
    #[error("resource has no id")]
    MissingId,
    #[error("malformed reference {reference:?}: expected \"Type/id\"")]
    MalformedReference { reference: String },
    #[error("{file_name}: refusing vCard content type {mime}")]
    VcardContentType { file_name: String, mime: String },
}

impl TransformError {
    pub(crate) fn shape(resource: &Resource, message: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            context: resource
                .type_and_id()
                .unwrap_or_else(|| "<unidentified resource>".to_string()),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
