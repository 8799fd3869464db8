//! DocumentReference rewrite.

use serde_json::{Value, json};

use fas_model::Resource;

use crate::error::{Result, TransformError};

/// Extension url carrying the attachment size dropped from R4B.
pub const FILE_SIZE_EXTENSION_URL: &str =
    "https://nih-ncpi.github.io/ncpi-fhir-ig-2/StructureDefinition/file-size";

/// Migrate a DocumentReference.
///
/// Drops documents whose subject references a Specimen; those only make
/// sense before assay synthesis has rewired them to a patient.
pub(super) fn migrate_document_reference(mut resource: Resource) -> Result<Option<Resource>> {
    resource.remove("version");

    let mut sizes = Vec::new();
    if let Some(Value::Array(contents)) = resource.get_mut("content") {
        for content in contents.iter_mut() {
            let Some(content) = content.as_object_mut() else {
                continue;
            };
            if let Some(profile) = content.shift_remove("profile") {
                if let Some(format) = profile.get(0).and_then(|entry| entry.get("valueCoding")) {
                    content.insert("format".to_string(), format.clone());
                }
            }
            if let Some(attachment) = content.get_mut("attachment").and_then(Value::as_object_mut)
            {
                if let Some(size) = attachment.shift_remove("size") {
                    sizes.push(size);
                }
            }
        }
    }
    for size in sizes {
        let bytes = size_in_bytes(&size).ok_or_else(|| {
            TransformError::shape(&resource, format!("attachment size {size} is not an integer"))
        })?;
        resource.extensions_mut().push(json!({
            "url": FILE_SIZE_EXTENSION_URL,
            "valueQuantity": {
                "value": bytes,
                "unit": "bytes",
                "system": "http://unitsofmeasure.org",
                "code": "bytes",
            },
        }));
    }

    let specimen_subject = resource
        .get("subject")
        .and_then(|subject| subject.get("reference"))
        .and_then(Value::as_str)
        .is_some_and(|reference| reference.contains("Specimen"));
    if specimen_subject {
        return Ok(None);
    }
    Ok(Some(resource))
}

fn size_in_bytes(size: &Value) -> Option<i64> {
    match size {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}
