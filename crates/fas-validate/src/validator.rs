//! Resource validation seam.
//!
//! The pipeline treats validation as a black box behind the [`Validator`]
//! trait so a schema-aware implementation can be slotted in without touching
//! the runner. The default [`StructuralValidator`] checks the invariants the
//! rest of the pipeline depends on: a typed, identified resource whose
//! reference slots all hold strings or maps.

use serde_json::{Map, Value};

use fas_model::{FhirVersion, Resource};

use crate::error::{Result, ValidateError};

/// Black-box validation of one resource against a target schema version.
pub trait Validator {
    fn validate(&self, resource: &Resource, version: FhirVersion) -> Result<()>;
}

/// Structural default: resourceType, id, and reference shapes.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

impl Validator for StructuralValidator {
    fn validate(&self, resource: &Resource, _version: FhirVersion) -> Result<()> {
        let context = resource
            .type_and_id()
            .or_else(|| resource.resource_type().map(str::to_string))
            .unwrap_or_else(|| "<unidentified resource>".to_string());

        let resource_type = resource.resource_type().unwrap_or_default();
        if resource_type.is_empty() {
            return Err(ValidateError::Invalid {
                context,
                message: "resource has no resourceType".to_string(),
            });
        }
        if resource.id().is_none_or(str::is_empty) {
            return Err(ValidateError::Invalid {
                context,
                message: format!("{resource_type} has no id"),
            });
        }
        check_reference_shapes(resource.as_map(), &context)
    }
}

fn check_reference_shapes(map: &Map<String, Value>, context: &str) -> Result<()> {
    for (key, value) in map {
        if key == "reference" && !matches!(value, Value::String(_) | Value::Object(_)) {
            return Err(ValidateError::BadReference {
                context: context.to_string(),
                found: value.to_string(),
            });
        }
        check_value(value, context)?;
    }
    Ok(())
}

fn check_value(value: &Value, context: &str) -> Result<()> {
    match value {
        Value::Object(map) => check_reference_shapes(map, context),
        Value::Array(entries) => {
            for entry in entries {
                check_value(entry, context)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(value: Value) -> Resource {
        Resource::from_value(value).expect("resource")
    }

    #[test]
    fn well_formed_resource_passes() {
        let validator = StructuralValidator;
        validator
            .validate(
                &resource(json!({
                    "resourceType": "Specimen",
                    "id": "s1",
                    "subject": {"reference": "Patient/p1"},
                })),
                FhirVersion::R4B,
            )
            .expect("valid");
    }

    #[test]
    fn missing_id_fails() {
        let validator = StructuralValidator;
        let error = validator
            .validate(
                &resource(json!({"resourceType": "Specimen"})),
                FhirVersion::R5,
            )
            .expect_err("no id");
        assert!(error.to_string().contains("has no id"), "{error}");
    }

    #[test]
    fn missing_resource_type_fails() {
        let validator = StructuralValidator;
        assert!(
            validator
                .validate(&resource(json!({"id": "x"})), FhirVersion::R5)
                .is_err()
        );
    }

    #[test]
    fn numeric_reference_fails() {
        let validator = StructuralValidator;
        let error = validator
            .validate(
                &resource(json!({
                    "resourceType": "Specimen",
                    "id": "s1",
                    "subject": {"reference": 42},
                })),
                FhirVersion::R4B,
            )
            .expect_err("bad reference");
        assert!(matches!(error, ValidateError::BadReference { .. }));
    }
}
