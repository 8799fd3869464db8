//! Emitted-id and seen-reference bookkeeping.
//!
//! The ledger accumulates across the whole pipeline run: every validated
//! resource contributes its `Type/id` and every `reference` value found in
//! its tree. The closure check at the end requires the reference set to be a
//! subset of the id set.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use tracing::debug;

use fas_model::Resource;

use crate::error::{Result, ValidateError};

/// Process-scoped accumulator of emitted ids and seen references.
#[derive(Debug, Default)]
pub struct ReferenceLedger {
    ids: BTreeSet<String>,
    references: BTreeSet<String>,
}

impl ReferenceLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource: its `Type/id` plus every reference in its tree.
    pub fn register(&mut self, resource: &Resource) -> Result<()> {
        let type_and_id = resource.type_and_id().ok_or_else(|| ValidateError::Invalid {
            context: resource.resource_type().unwrap_or("<untyped>").to_string(),
            message: "resource has no resourceType/id pair".to_string(),
        })?;
        self.ids.insert(type_and_id.clone());
        collect_references(resource.as_map(), &type_and_id, &mut self.references)?;
        Ok(())
    }

    #[must_use]
    pub fn id_count(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Require every seen reference to name a registered id.
    pub fn check_closure(&self) -> Result<()> {
        let dangling: Vec<String> = self.references.difference(&self.ids).cloned().collect();
        debug!(
            ids = self.ids.len(),
            references = self.references.len(),
            dangling = dangling.len(),
            "reference closure check"
        );
        if dangling.is_empty() {
            Ok(())
        } else {
            Err(ValidateError::DanglingReferences { references: dangling })
        }
    }
}

fn collect_references(
    map: &Map<String, Value>,
    context: &str,
    references: &mut BTreeSet<String>,
) -> Result<()> {
    for (key, value) in map {
        if key == "reference" {
            match value {
                Value::String(target) => {
                    references.insert(target.clone());
                    continue;
                }
                Value::Object(_) => {}
                other => {
                    return Err(ValidateError::BadReference {
                        context: context.to_string(),
                        found: other.to_string(),
                    });
                }
            }
        }
        collect_value(value, context, references)?;
    }
    Ok(())
}

fn collect_value(
    value: &Value,
    context: &str,
    references: &mut BTreeSet<String>,
) -> Result<()> {
    match value {
        Value::Object(map) => collect_references(map, context, references),
        Value::Array(entries) => {
            for entry in entries {
                collect_value(entry, context, references)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
