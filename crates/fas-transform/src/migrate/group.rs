//! Group rewrite.

use serde_json::json;

use fas_model::Resource;

use crate::error::Result;

pub(super) fn migrate_group(mut resource: Resource) -> Result<Option<Resource>> {
    resource.remove("membership");
    if !resource.contains_key("actual") {
        resource.insert("actual", json!(true));
    }
    if !resource.contains_key("type") {
        resource.insert("type", json!("person"));
    }
    Ok(Some(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_membership_and_fills_defaults() {
        let resource = Resource::from_value(json!({
            "resourceType": "Group",
            "id": "g1",
            "membership": "definitional",
        }))
        .expect("resource");
        let migrated = migrate_group(resource).expect("migrate").expect("kept");
        assert!(!migrated.contains_key("membership"));
        assert_eq!(migrated.get("actual"), Some(&json!(true)));
        assert_eq!(migrated.get("type"), Some(&json!("person")));
    }

    #[test]
    fn existing_values_are_kept() {
        let resource = Resource::from_value(json!({
            "resourceType": "Group",
            "id": "g1",
            "actual": false,
            "type": "specimen",
        }))
        .expect("resource");
        let migrated = migrate_group(resource).expect("migrate").expect("kept");
        assert_eq!(migrated.get("actual"), Some(&json!(false)));
        assert_eq!(migrated.get("type"), Some(&json!("specimen")));
    }
}
