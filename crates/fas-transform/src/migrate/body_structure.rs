//! BodyStructure rewrite.

use fas_model::Resource;

use crate::error::Result;

pub(super) fn migrate_body_structure(mut resource: Resource) -> Result<Option<Resource>> {
    if let Some(included) = resource.remove("includedStructure") {
        if let Some(structure) = included.get(0).and_then(|entry| entry.get("structure")) {
            resource.insert("location", structure.clone());
        }
    }
    Ok(Some(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collapses_included_structure() {
        let resource = Resource::from_value(json!({
            "resourceType": "BodyStructure",
            "id": "b1",
            "includedStructure": [{"structure": {"coding": [{"code": "181608004"}]}}],
        }))
        .expect("resource");
        let migrated = migrate_body_structure(resource)
            .expect("migrate")
            .expect("kept");
        assert!(!migrated.contains_key("includedStructure"));
        assert_eq!(
            migrated.get("location").and_then(|location| location.get("coding")),
            Some(&json!([{"code": "181608004"}]))
        );
    }

    #[test]
    fn absent_included_structure_is_a_noop() {
        let resource = Resource::from_value(json!({
            "resourceType": "BodyStructure",
            "id": "b1",
        }))
        .expect("resource");
        let migrated = migrate_body_structure(resource)
            .expect("migrate")
            .expect("kept");
        assert!(!migrated.contains_key("location"));
    }
}
