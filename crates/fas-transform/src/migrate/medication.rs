//! Medication rewrite.

use fas_model::Resource;

use crate::error::Result;

use super::common::strip_quotes_from_coding_system;

pub(super) fn migrate_medication(mut resource: Resource) -> Result<Option<Resource>> {
    if let Some(code) = resource.get_mut("code") {
        strip_quotes_from_coding_system(code);
    }
    Ok(Some(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cleans_the_code_system() {
        let resource = Resource::from_value(json!({
            "resourceType": "Medication",
            "id": "med1",
            "code": {"coding": [{"system": "'http://rxnorm.org'", "code": "1191"}]},
        }))
        .expect("resource");
        let migrated = migrate_medication(resource).expect("migrate").expect("kept");
        assert_eq!(
            migrated
                .get("code")
                .and_then(|code| code.get("coding"))
                .and_then(|coding| coding.get(0))
                .and_then(|first| first.get("system")),
            Some(&json!("http://rxnorm.org"))
        );
    }
}
