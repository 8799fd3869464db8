//! Attachment content-type resolution.
//!
//! The genomic table runs before the general-purpose guess so bioinformatics
//! suffixes are never mistaken for unrelated registered types (`.vcf` would
//! otherwise resolve to a vCard).

use serde_json::{Map, Value};

use fas_model::Resource;

use crate::error::{Result, TransformError};

/// Fallback for file names no table recognises.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const GENOMIC_TYPES: &[(&str, &str)] = &[
    ("r", "text/x-r"),
    ("maf", "text/tab-separated-values"),
    ("bed5", "text/tab-separated-values"),
    ("bed", "text/tab-separated-values"),
    ("sam", "text/tab-separated-values"),
    ("vcf", "text/tab-separated-values+vcf"),
    ("yaml", "text/yaml"),
    ("md", "text/x-markdown"),
    ("markdown", "text/x-markdown"),
];

const ENCODING_SUFFIXES: &[&str] = &[".gz", ".bz2", ".xz"];

/// Resolve the MIME type for a file name.
///
/// Compression suffixes are stripped first, then the genomic table, then
/// the registry guess, then [`DEFAULT_CONTENT_TYPE`]. A vCard result is a
/// fatal error.
pub fn resolve_content_type(file_name: &str) -> Result<String> {
    let stripped = strip_encoding_suffix(file_name);
    let mime = extension_of(stripped)
        .as_deref()
        .and_then(genomic_type)
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(stripped)
                .first_raw()
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string()
        });
    if mime.contains("vcard") {
        return Err(TransformError::VcardContentType {
            file_name: file_name.to_string(),
            mime,
        });
    }
    Ok(mime)
}

/// Recompute `content[0].attachment.contentType` from the attachment's
/// title or url. A url whose path carries an extension wins over the title.
pub fn update_mime_type(document: &mut Resource) -> Result<()> {
    let attachment = document
        .get("content")
        .and_then(|content| content.get(0))
        .and_then(|entry| entry.get("attachment"))
        .and_then(Value::as_object)
        .ok_or_else(|| TransformError::shape(document, "document has no content[0].attachment"))?;
    let file_name = attachment_file_name(attachment).ok_or_else(|| {
        TransformError::shape(document, "attachment has no usable title or url")
    })?;
    let mime = resolve_content_type(&file_name)?;
    if !set_content_type(document, &mime) {
        return Err(TransformError::shape(
            document,
            "document has no content[0].attachment",
        ));
    }
    Ok(())
}

fn set_content_type(document: &mut Resource, mime: &str) -> bool {
    let Some(attachment) = document
        .get_mut("content")
        .and_then(|content| content.get_mut(0))
        .and_then(|entry| entry.get_mut("attachment"))
        .and_then(Value::as_object_mut)
    else {
        return false;
    };
    attachment.insert("contentType".to_string(), Value::String(mime.to_string()));
    true
}

fn attachment_file_name(attachment: &Map<String, Value>) -> Option<String> {
    let mut file_name = attachment
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Some(url) = attachment.get("url").and_then(Value::as_str) {
        let path = url_path(url);
        if path.contains('.') {
            file_name = Some(path.to_string());
        }
    }
    file_name
}

fn url_path(url: &str) -> &str {
    let trimmed = url.split(['#', '?']).next().unwrap_or(url);
    match trimmed.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |index| &rest[index..]),
        None => trimmed,
    }
}

fn strip_encoding_suffix(file_name: &str) -> &str {
    for suffix in ENCODING_SUFFIXES {
        if let Some(stripped) = file_name.strip_suffix(suffix) {
            return stripped;
        }
    }
    file_name
}

fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
}

fn genomic_type(extension: &str) -> Option<&'static str> {
    GENOMIC_TYPES
        .iter()
        .find(|(known, _)| *known == extension)
        .map(|(_, mime)| *mime)
}
