//! Schemaless FHIR resource wrapper.
//!
//! Resources are arbitrarily nested JSON objects carrying a `resourceType`
//! discriminator. No fixed schema is enforced here; shape is discovered
//! dynamically by the pipeline stages. Key order of the input is preserved
//! on re-emission.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FasError, Result};

/// One clinical/genomic record in the aggregator's document model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Map<String, Value>);

impl Resource {
    /// Wrap a JSON object map as a resource.
    #[must_use]
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Convert a JSON value into a resource, rejecting non-object shapes.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(FasError::Message(format!(
                "expected a JSON object resource, got {other}"
            ))),
        }
    }

    /// Parse a resource from one NDJSON line.
    pub fn from_json_line(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line.trim())?;
        Self::from_value(value)
    }

    /// Serialize the resource as a single JSON line.
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Serialize the resource pretty-printed, for diagnostics.
    #[must_use]
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "<unserializable>".to_string())
    }

    /// The `resourceType` discriminator, when present and a string.
    #[must_use]
    pub fn resource_type(&self) -> Option<&str> {
        self.0.get("resourceType").and_then(Value::as_str)
    }

    /// The resource `id`, when present and a string.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn set_id(&mut self, id: String) {
        self.0.insert("id".to_string(), Value::String(id));
    }

    /// The `"<resourceType>/<id>"` form used by references and the ledger.
    #[must_use]
    pub fn type_and_id(&self) -> Option<String> {
        match (self.resource_type(), self.id()) {
            (Some(resource_type), Some(id)) => Some(format!("{resource_type}/{id}")),
            _ => None,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Clone the resource into a JSON value for generic tree walks.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// The top-level `extension` list, when present.
    #[must_use]
    pub fn extensions(&self) -> Option<&Vec<Value>> {
        self.0.get("extension").and_then(Value::as_array)
    }

    /// Mutable access to the top-level `extension` list, created on demand.
    pub fn extensions_mut(&mut self) -> &mut Vec<Value> {
        let entry = self
            .0
            .entry("extension".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        entry.as_array_mut().expect("extension is an array")
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        Value::Object(resource.0)
    }
}
