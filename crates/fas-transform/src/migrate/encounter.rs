//! Encounter rewrite.

use serde_json::{Value, json};

use fas_model::Resource;

use crate::error::Result;

pub(super) fn migrate_encounter(mut resource: Resource) -> Result<Option<Resource>> {
    if let Some(reason) = resource.remove("reason") {
        let mut references = Vec::new();
        if let Value::Array(entries) = reason {
            for entry in entries {
                let Some(values) = entry.get("value").and_then(Value::as_array) else {
                    continue;
                };
                for value in values {
                    match value.get("reference") {
                        Some(Value::String(target)) => {
                            references.push(json!({"reference": target}));
                        }
                        Some(Value::Object(map)) => references.push(Value::Object(map.clone())),
                        _ => {}
                    }
                }
            }
        }
        resource.insert("reasonReference", Value::Array(references));
    }

    match resource.get_mut("class") {
        Some(class) => {
            let single = match &*class {
                Value::Object(concept) => {
                    concept.get("coding").and_then(|coding| coding.get(0)).cloned()
                }
                Value::Array(entries) => entries
                    .first()
                    .and_then(|concept| concept.get("coding"))
                    .and_then(|coding| coding.get(0))
                    .cloned(),
                _ => None,
            };
            if let Some(single) = single {
                *class = single;
            }
        }
        None => {
            resource.insert("class", json!({"code": "NONAC", "display": "inpatient non-acute"}));
        }
    }

    resource.insert("status", json!("finished"));
    Ok(Some(resource))
}
