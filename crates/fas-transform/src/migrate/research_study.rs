//! ResearchStudy rewrite.

use serde_json::Value;

use fas_model::Resource;

use crate::error::Result;

pub(super) fn migrate_research_study(mut resource: Resource) -> Result<Option<Resource>> {
    resource.remove("name");
    if let Some(status) = resource.get_mut("status") {
        if matches!(status.as_str(), Some("open" | "open-to-enrollment")) {
            *status = Value::String("active".to_string());
        }
    }
    Ok(Some(resource))
}
