//! Cross-resource reference handling.
//!
//! A reference is either a plain `"<ResourceType>/<id>"` string or, for
//! CodeableReference-style fields, a map wrapping such a string. Any other
//! JSON shape in a `reference` position is a structural error.

use serde_json::Value;

use crate::error::{FasError, Result};

/// Tagged reference variant, extraction made explicit instead of runtime
/// type-checking.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// A plain `"Type/id"` string.
    Direct(String),
    /// A CodeableReference wrapper; the inner `reference` may be absent.
    Codeable { reference: Option<String> },
}

impl Reference {
    /// Classify a JSON value found in a `reference` position.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Self::Direct(text.clone())),
            Value::Object(map) => Ok(Self::Codeable {
                reference: map
                    .get("reference")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            other => Err(FasError::Message(format!(
                "invalid reference type: {other}"
            ))),
        }
    }

    /// The `"Type/id"` target, when one is present.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Direct(target) => Some(target),
            Self::Codeable { reference } => reference.as_deref(),
        }
    }
}

/// Split `"Type/id"` into its two segments.
#[must_use]
pub fn split_reference(reference: &str) -> Option<(&str, &str)> {
    reference.split_once('/')
}

/// The id segment of a `"Type/id"` reference.
#[must_use]
pub fn reference_id(reference: &str) -> Option<&str> {
    split_reference(reference).map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_direct_and_codeable() {
        let direct = Reference::from_value(&json!("Patient/p1")).expect("direct");
        assert_eq!(direct.target(), Some("Patient/p1"));

        let codeable = Reference::from_value(&json!({"reference": "Medication/m1"}))
            .expect("codeable");
        assert_eq!(codeable.target(), Some("Medication/m1"));

        let empty = Reference::from_value(&json!({"display": "aspirin"})).expect("codeable");
        assert_eq!(empty.target(), None);
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(Reference::from_value(&json!(42)).is_err());
        assert!(Reference::from_value(&json!(["Patient/p1"])).is_err());
    }

    #[test]
    fn splits_type_and_id() {
        assert_eq!(split_reference("Specimen/s1"), Some(("Specimen", "s1")));
        assert_eq!(reference_id("Specimen/s1"), Some("s1"));
        assert_eq!(split_reference("no-slash"), None);
    }
}
