//! ResearchSubject rewrite.

use serde_json::json;

use fas_model::Resource;

use crate::error::Result;

pub(super) fn migrate_research_subject(mut resource: Resource) -> Result<Option<Resource>> {
    if let Some(subject) = resource.remove("subject") {
        resource.insert("individual", subject);
    }
    resource.insert("status", json!("on-study"));
    Ok(Some(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subject_becomes_individual() {
        let resource = Resource::from_value(json!({
            "resourceType": "ResearchSubject",
            "id": "rs1",
            "status": "active",
            "subject": {"reference": "Patient/p1"},
        }))
        .expect("resource");
        let migrated = migrate_research_subject(resource)
            .expect("migrate")
            .expect("kept");
        assert!(!migrated.contains_key("subject"));
        assert_eq!(
            migrated.get("individual"),
            Some(&json!({"reference": "Patient/p1"}))
        );
        assert_eq!(migrated.get("status"), Some(&json!("on-study")));
    }
}
