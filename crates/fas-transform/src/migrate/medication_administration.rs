//! MedicationAdministration rewrite.

use serde_json::Value;

use fas_model::Resource;

use crate::datetime::day_offset_timestamp;
use crate::error::{Result, TransformError};

use super::common::strip_quotes_from_coding_system;

// R5 exports misspell several occurrence fields; every spelling maps to
// effectiveDateTime.
const OCCURRENCE_KEYS: &[&str] = &["occurrenceDateTime", "occurenceDateTime", "occurenceTime"];

pub(super) fn migrate_medication_administration(
    mut resource: Resource,
) -> Result<Option<Resource>> {
    if let Some(medication) = resource.remove("medication") {
        if let Some(concept) = medication.get("concept") {
            resource.insert("medicationCodeableConcept", concept.clone());
        } else if let Some(reference) = medication.get("reference") {
            resource.insert("medicationReference", reference.clone());
        }
    }

    for key in OCCURRENCE_KEYS {
        if let Some(value) = resource.remove(key) {
            resource.insert("effectiveDateTime", value);
        }
    }

    if let Some(timing) = resource.remove("occurenceTiming") {
        let days = timing
            .get("repeat")
            .and_then(|repeat| repeat.get("boundsRange"))
            .and_then(|bounds| bounds.get("low"))
            .and_then(|low| low.get("value"))
            .and_then(day_count)
            .ok_or_else(|| {
                TransformError::shape(
                    &resource,
                    "occurenceTiming has no repeat.boundsRange.low.value",
                )
            })?;
        resource.insert(
            "effectiveDateTime",
            Value::String(day_offset_timestamp(days)),
        );
    }

    if let Some(category) = resource.get_mut("category") {
        if let Some(first) = category.get(0).cloned() {
            *category = first;
        }
    }

    if let Some(concept) = resource.get_mut("medicationCodeableConcept") {
        strip_quotes_from_coding_system(concept);
    }
    Ok(Some(resource))
}

fn day_count(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|days| days as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn medication_concept_splits_out() {
        let resource = Resource::from_value(json!({
            "resourceType": "MedicationAdministration",
            "id": "m1",
            "medication": {"concept": {"coding": [{"system": "'http://rxnorm.org'", "code": "1191"}]}},
            "occurenceDateTime": "2021-06-01T00:00:00Z",
            "category": [{"coding": [{"code": "inpatient"}]}],
        }))
        .expect("resource");
        let migrated = migrate_medication_administration(resource)
            .expect("migrate")
            .expect("kept");
        assert!(!migrated.contains_key("medication"));
        assert_eq!(
            migrated.get("medicationCodeableConcept"),
            Some(&json!({"coding": [{"system": "http://rxnorm.org", "code": "1191"}]}))
        );
        assert_eq!(
            migrated.get("effectiveDateTime"),
            Some(&json!("2021-06-01T00:00:00Z"))
        );
        assert_eq!(
            migrated.get("category"),
            Some(&json!({"coding": [{"code": "inpatient"}]}))
        );
    }

    #[test]
    fn medication_reference_splits_out() {
        let resource = Resource::from_value(json!({
            "resourceType": "MedicationAdministration",
            "id": "m1",
            "medication": {"reference": {"reference": "Medication/med1"}},
        }))
        .expect("resource");
        let migrated = migrate_medication_administration(resource)
            .expect("migrate")
            .expect("kept");
        assert_eq!(
            migrated.get("medicationReference"),
            Some(&json!({"reference": "Medication/med1"}))
        );
    }

    #[test]
    fn timing_bounds_become_a_timestamp() {
        let resource = Resource::from_value(json!({
            "resourceType": "MedicationAdministration",
            "id": "m1",
            "occurenceTiming": {"repeat": {"boundsRange": {
                "low": {"value": 1},
                "high": {"value": 14},
            }}},
        }))
        .expect("resource");
        let migrated = migrate_medication_administration(resource)
            .expect("migrate")
            .expect("kept");
        assert_eq!(
            migrated.get("effectiveDateTime"),
            Some(&json!("2024-12-31T10:10:00Z"))
        );
    }

    #[test]
    fn timing_without_bounds_is_fatal() {
        let resource = Resource::from_value(json!({
            "resourceType": "MedicationAdministration",
            "id": "m1",
            "occurenceTiming": {"repeat": {}},
        }))
        .expect("resource");
        assert!(migrate_medication_administration(resource).is_err());
    }
}
