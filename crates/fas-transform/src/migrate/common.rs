//! Helpers shared by the per-type rewrites.

use serde_json::Value;

/// Strip stray single quotes from the first coding's `system` of a
/// CodeableConcept value. Source exports occasionally wrap the system url in
/// quotes, which the aggregation service rejects.
pub(super) fn strip_quotes_from_coding_system(concept: &mut Value) {
    let Some(system) = concept
        .get_mut("coding")
        .and_then(|coding| coding.get_mut(0))
        .and_then(|first| first.get_mut("system"))
    else {
        return;
    };
    if let Some(text) = system.as_str() {
        if text.contains('\'') {
            *system = Value::String(text.replace('\'', ""));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_quotes_in_place() {
        let mut concept = json!({"coding": [{"system": "'http://loinc.org'", "code": "x"}]});
        strip_quotes_from_coding_system(&mut concept);
        assert_eq!(
            concept["coding"][0]["system"],
            json!("http://loinc.org")
        );
    }

    #[test]
    fn tolerates_missing_pieces() {
        let mut concept = json!({"text": "aspirin"});
        strip_quotes_from_coding_system(&mut concept);
        assert_eq!(concept, json!({"text": "aspirin"}));
    }
}
