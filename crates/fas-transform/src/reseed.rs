//! Deterministic identifier reseeding.
//!
//! Reseeding rewrites a resource's id and every `"Type/id"` reference in its
//! tree to UUIDv5 hashes of the original id plus the seed, so a whole batch
//! can be re-keyed consistently without a lookup table.

use serde_json::{Map, Value};

use fas_model::Resource;
use fas_model::ids::reseeded_id;
use fas_model::reference::split_reference;

use crate::error::{Result, TransformError};

/// Rewrite the resource id and every string reference under the seed.
pub fn reseed(resource: &mut Resource, seed: &str) -> Result<()> {
    let id = resource.id().ok_or(TransformError::MissingId)?.to_string();
    resource.set_id(reseeded_id(&id, seed));
    reseed_map(resource.as_map_mut(), seed)
}

fn reseed_map(map: &mut Map<String, Value>, seed: &str) -> Result<()> {
    for (key, value) in map.iter_mut() {
        if key == "reference" {
            if let Value::String(reference) = value {
                *reference = reseed_reference(reference, seed)?;
                continue;
            }
        }
        reseed_value(value, seed)?;
    }
    Ok(())
}

fn reseed_value(value: &mut Value, seed: &str) -> Result<()> {
    match value {
        Value::Object(map) => reseed_map(map, seed),
        Value::Array(entries) => {
            for entry in entries {
                reseed_value(entry, seed)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn reseed_reference(reference: &str, seed: &str) -> Result<String> {
    let Some((resource_type, id)) = split_reference(reference) else {
        return Err(TransformError::MalformedReference {
            reference: reference.to_string(),
        });
    };
    Ok(format!("{resource_type}/{}", reseeded_id(id, seed)))
}
