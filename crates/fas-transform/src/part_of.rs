//! Study-provenance tagging.

use fas_model::Resource;
use fas_model::extension::{has_part_of_study, part_of_study_extension};

/// Tag a resource with the governing study's part-of-study extension.
///
/// ResearchStudy resources are never tagged, and a resource already carrying
/// a part-of-study extension keeps its existing tag.
pub fn apply_part_of(resource: &mut Resource, research_study_id: &str) {
    if resource.resource_type() == Some("ResearchStudy") {
        return;
    }
    if has_part_of_study(resource) {
        return;
    }
    resource
        .extensions_mut()
        .push(part_of_study_extension(research_study_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use fas_model::extension::research_study_id;
    use serde_json::json;

    #[test]
    fn tags_untagged_resources() {
        let mut resource = Resource::from_value(json!({
            "resourceType": "Specimen",
            "id": "s1",
        }))
        .expect("resource");
        apply_part_of(&mut resource, "study-1");
        assert_eq!(research_study_id(&resource).as_deref(), Some("study-1"));
    }

    #[test]
    fn research_study_is_left_alone() {
        let mut resource = Resource::from_value(json!({
            "resourceType": "ResearchStudy",
            "id": "study-1",
        }))
        .expect("resource");
        apply_part_of(&mut resource, "study-1");
        assert!(resource.extensions().is_none());
    }

    #[test]
    fn existing_tag_is_kept() {
        let mut resource = Resource::from_value(json!({
            "resourceType": "Specimen",
            "id": "s1",
            "extension": [part_of_study_extension("original-study")],
        }))
        .expect("resource");
        apply_part_of(&mut resource, "other-study");
        assert_eq!(resource.extensions().map(Vec::len), Some(1));
        assert_eq!(
            research_study_id(&resource).as_deref(),
            Some("original-study")
        );
    }

    #[test]
    fn foreign_extensions_are_preserved() {
        let mut resource = Resource::from_value(json!({
            "resourceType": "Specimen",
            "id": "s1",
            "extension": [{"url": "http://example.org/other", "valueString": "x"}],
        }))
        .expect("resource");
        apply_part_of(&mut resource, "study-1");
        assert_eq!(resource.extensions().map(Vec::len), Some(2));
    }
}
