//! R5 to R4B schema migration.
//!
//! Each supported resource type has its own rewrite module; anything not
//! listed passes through untouched. Rewrites return `None` when the resource
//! must be dropped from the output entirely.
//!
//! | Resource type | Rewrite |
//! |---------------|---------|
//! | BodyStructure | `includedStructure` collapsed to `location` |
//! | DocumentReference | `version`/`profile` removal, size extension, specimen-subject drop |
//! | Encounter | `reason` to `reasonReference`, `class` to single Coding, status `finished` |
//! | Group | `membership` removal, `actual`/`type` defaults |
//! | ImagingStudy | `basedOn` to `procedureReference`, per-series modality collapse |
//! | Medication | coding system quote cleanup |
//! | MedicationAdministration | `medication` split, occurrence fields to `effectiveDateTime` |
//! | ResearchStudy | `name` removal, status normalization |
//! | ResearchSubject | `subject` to `individual`, status `on-study` |
//! | Specimen | processing `method` to `procedure`, collection `procedure` removal |

mod body_structure;
mod common;
mod document_reference;
mod encounter;
mod group;
mod imaging_study;
mod medication;
mod medication_administration;
mod research_study;
mod research_subject;
mod specimen;

pub use document_reference::FILE_SIZE_EXTENSION_URL;

use fas_model::Resource;

use crate::error::Result;

/// Migrate one resource, dispatching on its `resourceType`.
///
/// Returns `Ok(None)` when the rewrite decides the resource must not be
/// emitted. Unknown types pass through unchanged.
pub fn migrate(resource: Resource) -> Result<Option<Resource>> {
    let resource_type = resource.resource_type().unwrap_or_default().to_string();
    match resource_type.as_str() {
        "BodyStructure" => body_structure::migrate_body_structure(resource),
        "DocumentReference" => document_reference::migrate_document_reference(resource),
        "Encounter" => encounter::migrate_encounter(resource),
        "Group" => group::migrate_group(resource),
        "ImagingStudy" => imaging_study::migrate_imaging_study(resource),
        "Medication" => medication::migrate_medication(resource),
        "MedicationAdministration" => {
            medication_administration::migrate_medication_administration(resource)
        }
        "ResearchStudy" => research_study::migrate_research_study(resource),
        "ResearchSubject" => research_subject::migrate_research_subject(resource),
        "Specimen" => specimen::migrate_specimen(resource),
        _ => Ok(Some(resource)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_types_pass_through() {
        let resource = Resource::from_value(json!({
            "resourceType": "Patient",
            "id": "p1",
            "gender": "female",
        }))
        .expect("resource");
        let migrated = migrate(resource.clone()).expect("migrate").expect("kept");
        assert_eq!(migrated, resource);
    }

    #[test]
    fn untyped_resources_pass_through() {
        let resource = Resource::from_value(json!({"id": "x"})).expect("resource");
        assert!(migrate(resource).expect("migrate").is_some());
    }
}
