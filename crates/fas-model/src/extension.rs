//! Part-of-study extension helpers.

use serde_json::{Value, json};

use crate::resource::Resource;

/// Extension url linking any resource to its governing ResearchStudy.
pub const PART_OF_STUDY_URL: &str =
    "http://fhir-aggregator.org/fhir/StructureDefinition/part-of-study";

/// Build a part-of-study extension entry for the given study id.
#[must_use]
pub fn part_of_study_extension(research_study_id: &str) -> Value {
    json!({
        "url": PART_OF_STUDY_URL,
        "valueReference": {"reference": format!("ResearchStudy/{research_study_id}")},
    })
}

/// True when the resource already carries an extension whose url names
/// part-of-study.
#[must_use]
pub fn has_part_of_study(resource: &Resource) -> bool {
    resource
        .extensions()
        .is_some_and(|extensions| {
            extensions.iter().any(|extension| {
                extension
                    .get("url")
                    .and_then(Value::as_str)
                    .is_some_and(|url| url.contains("part-of-study"))
            })
        })
}

/// Extract the governing ResearchStudy id from the part-of-study extension,
/// without the `ResearchStudy/` prefix. `None` when the extension is absent.
#[must_use]
pub fn research_study_id(resource: &Resource) -> Option<String> {
    let extensions = resource.extensions()?;
    for extension in extensions {
        if extension.get("url").and_then(Value::as_str) != Some(PART_OF_STUDY_URL) {
            continue;
        }
        let reference = extension
            .get("valueReference")
            .and_then(|value| value.get("reference"))
            .and_then(Value::as_str)?;
        let id = reference
            .strip_prefix("ResearchStudy/")
            .unwrap_or(reference);
        return Some(id.to_string());
    }
    None
}
