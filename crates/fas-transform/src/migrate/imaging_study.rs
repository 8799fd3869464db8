//! ImagingStudy rewrite.

use serde_json::Value;

use fas_model::Resource;

use crate::error::Result;

pub(super) fn migrate_imaging_study(mut resource: Resource) -> Result<Option<Resource>> {
    if let Some(based_on) = resource.remove("basedOn") {
        let first = match based_on {
            Value::Array(entries) => entries.into_iter().next(),
            other => Some(other),
        };
        if let Some(reference) = first {
            resource.insert("procedureReference", reference);
        }
    }

    if let Some(Value::Array(series)) = resource.get_mut("series") {
        for entry in series.iter_mut() {
            let Some(entry) = entry.as_object_mut() else {
                continue;
            };
            let Some(modality) = entry.get_mut("modality") else {
                continue;
            };
            if let Some(first) = modality
                .get("coding")
                .and_then(|coding| coding.get(0))
                .cloned()
            {
                *modality = first;
            }
            if let Some(system) = modality.get_mut("system") {
                if let Some(text) = system.as_str() {
                    if text.contains(' ') {
                        *system = Value::String(text.replace(' ', ""));
                    }
                }
            }
        }
    }
    Ok(Some(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn based_on_becomes_procedure_reference() {
        let resource = Resource::from_value(json!({
            "resourceType": "ImagingStudy",
            "id": "i1",
            "basedOn": [{"reference": "ServiceRequest/sr1"}, {"reference": "ServiceRequest/sr2"}],
        }))
        .expect("resource");
        let migrated = migrate_imaging_study(resource)
            .expect("migrate")
            .expect("kept");
        assert!(!migrated.contains_key("basedOn"));
        assert_eq!(
            migrated.get("procedureReference"),
            Some(&json!({"reference": "ServiceRequest/sr1"}))
        );
    }

    #[test]
    fn series_modality_collapses_and_system_loses_spaces() {
        let resource = Resource::from_value(json!({
            "resourceType": "ImagingStudy",
            "id": "i1",
            "series": [{
                "uid": "1.2.3",
                "modality": {"coding": [{"system": "http://dicom.nema.org/resources/ontology/ DCM", "code": "MR"}]},
            }],
        }))
        .expect("resource");
        let migrated = migrate_imaging_study(resource)
            .expect("migrate")
            .expect("kept");
        let modality = migrated
            .get("series")
            .and_then(|series| series.get(0))
            .and_then(|entry| entry.get("modality"))
            .expect("modality");
        assert_eq!(modality["code"], json!("MR"));
        assert_eq!(
            modality["system"],
            json!("http://dicom.nema.org/resources/ontology/DCM")
        );
    }
}
