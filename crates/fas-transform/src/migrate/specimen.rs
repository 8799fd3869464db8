//! Specimen rewrite.

use serde_json::Value;

use fas_model::Resource;

use crate::error::Result;

pub(super) fn migrate_specimen(mut resource: Resource) -> Result<Option<Resource>> {
    if let Some(Value::Array(processing)) = resource.get_mut("processing") {
        for process in processing.iter_mut() {
            let Some(process) = process.as_object_mut() else {
                continue;
            };
            if let Some(method) = process.shift_remove("method") {
                process.insert("procedure".to_string(), method);
            }
        }
    }
    if let Some(collection) = resource.get_mut("collection").and_then(Value::as_object_mut) {
        collection.shift_remove("procedure");
    }
    Ok(Some(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn processing_method_becomes_procedure() {
        let resource = Resource::from_value(json!({
            "resourceType": "Specimen",
            "id": "s1",
            "processing": [
                {"method": {"coding": [{"code": "freezing"}]}},
                {"description": "no method here"},
            ],
            "collection": {"procedure": {"reference": "Procedure/pr1"}, "bodySite": {"text": "lung"}},
        }))
        .expect("resource");
        let migrated = migrate_specimen(resource).expect("migrate").expect("kept");
        let first = migrated
            .get("processing")
            .and_then(|processing| processing.get(0))
            .expect("processing entry");
        assert!(first.get("method").is_none());
        assert_eq!(first["procedure"]["coding"][0]["code"], json!("freezing"));
        let collection = migrated.get("collection").expect("collection");
        assert!(collection.get("procedure").is_none());
        assert!(collection.get("bodySite").is_some());
    }
}
