//! Per-study vocabulary aggregation.
//!
//! Every resource flowing through the vocabulary stage contributes its coded
//! values to the histogram of the study it belongs to. Codings anywhere in
//! the tree (outside extensions) are tallied by display under
//! `"<resourceType>.<top-level-field>"`; top-level extension values are
//! tallied under `"<resourceType>.extension~<url>"`, with quantities widening
//! a min/max range instead of counting. The flush turns each study's
//! aggregates into one Observation.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value, json};
use tracing::debug;

use fas_model::{
    Resource, find_key, part_of_study_extension, research_study_id, vocabulary_observation_id,
};

use crate::error::{CoreError, Result};

/// CodeSystem url for the vocabulary Observation's own code.
pub const VOCABULARY_SYSTEM: &str = "http://fhir-aggregator.org/fhir/CodeSystem/vocabulary";

/// CodeSystem url tagging each component with the path it was tallied under.
pub const VOCABULARY_PATH_SYSTEM: &str =
    "http://fhir-aggregator.org/fhir/CodeSystem/vocabulary/path";

#[derive(Debug)]
struct CodingCount {
    display: String,
    count: u64,
    sample: Value,
}

#[derive(Debug)]
struct ValueCount {
    label: String,
    count: u64,
}

/// Aggregate for one `"<resourceType>.extension~<url>"` key.
#[derive(Debug)]
enum VocabularyEntry {
    Counts(Vec<ValueCount>),
    Range { min: Number, max: Number },
}

#[derive(Debug, Default)]
struct StudyVocabulary {
    codings: BTreeMap<String, Vec<CodingCount>>,
    extensions: BTreeMap<String, VocabularyEntry>,
}

/// Streaming histogram of coded values, one bucket per ResearchStudy.
#[derive(Debug, Default)]
pub struct VocabularyCollector {
    studies: BTreeMap<String, StudyVocabulary>,
}

impl VocabularyCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of studies with at least one collected resource.
    #[must_use]
    pub fn study_count(&self) -> usize {
        self.studies.len()
    }

    /// Tally one resource into its study's histogram.
    ///
    /// The resource must carry a part-of-study extension; collecting an
    /// untagged resource is fatal.
    pub fn collect(&mut self, resource: &Resource) -> Result<()> {
        let study_id = research_study_id(resource)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CoreError::MissingPartOfStudy {
                context: context_of(resource),
            })?;
        let resource_type = resource.resource_type().unwrap_or("Unknown").to_string();
        let context = context_of(resource);
        let study = self.studies.entry(study_id).or_default();
        study.tally_codings(&resource_type, resource.as_map());
        study.tally_extensions(&resource_type, &context, resource.extensions())
    }

    /// Render one Observation per study and consume the aggregates.
    pub fn flush(self) -> Result<Vec<Resource>> {
        let mut observations = Vec::new();
        for (study_id, study) in self.studies {
            let components = study.components();
            debug!(
                study = %study_id,
                components = components.len(),
                "vocabulary observation assembled"
            );
            let observation = Resource::from_value(json!({
                "resourceType": "Observation",
                "status": "final",
                "code": {"coding": [{
                    "system": VOCABULARY_SYSTEM,
                    "code": "vocabulary",
                    "display": "Vocabulary",
                }]},
                "component": components,
                "focus": [{"reference": format!("ResearchStudy/{study_id}")}],
                "extension": [part_of_study_extension(&study_id)],
                "id": vocabulary_observation_id(&study_id),
            }))?;
            observations.push(observation);
        }
        Ok(observations)
    }
}

impl StudyVocabulary {
    fn tally_codings(&mut self, resource_type: &str, map: &Map<String, Value>) {
        for found in find_key(map, "coding", &["extension"]) {
            let Some(head) = found.head_key() else {
                continue;
            };
            let Some(codings) = found.value.as_array() else {
                continue;
            };
            let key = format!("{resource_type}.{head}");
            let tallies = self.codings.entry(key).or_default();
            for coding in codings {
                let Some(display) = coding.get("display").and_then(Value::as_str) else {
                    continue;
                };
                match tallies.iter_mut().find(|tally| tally.display == display) {
                    Some(tally) => tally.count += 1,
                    None => tallies.push(CodingCount {
                        display: display.to_string(),
                        count: 1,
                        sample: coding.clone(),
                    }),
                }
            }
        }
    }

    fn tally_extensions(
        &mut self,
        resource_type: &str,
        context: &str,
        extensions: Option<&Vec<Value>>,
    ) -> Result<()> {
        let Some(extensions) = extensions else {
            return Ok(());
        };
        for extension in extensions {
            let Some(url) = extension.get("url").and_then(Value::as_str) else {
                continue;
            };
            let key = format!("{resource_type}.extension~{url}");
            if let Some(concept) = extension.get("valueCodeableConcept") {
                let codings = concept.get("coding").and_then(Value::as_array);
                for coding in codings.into_iter().flatten() {
                    if let Some(display) = coding.get("display").and_then(Value::as_str) {
                        self.tally_value(&key, display, context)?;
                    }
                }
            } else if let Some(value) = extension.get("valueCoding") {
                // both a single coding map and a list of them occur in the wild
                let singleton = std::slice::from_ref(value);
                let codings: &[Value] = match value {
                    Value::Array(items) => items,
                    _ => singleton,
                };
                for coding in codings {
                    if let Some(display) = coding.get("display").and_then(Value::as_str) {
                        self.tally_value(&key, display, context)?;
                    }
                }
            } else if let Some(code) = extension.get("valueCode").and_then(Value::as_str) {
                self.tally_value(&key, code, context)?;
            } else if let Some(text) = extension.get("valueString").and_then(Value::as_str) {
                self.tally_value(&key, text, context)?;
            } else if let Some(Value::Number(value)) =
                extension.get("valueQuantity").and_then(|q| q.get("value"))
            {
                self.record_quantity(key, value.clone());
            }
        }
        Ok(())
    }

    fn tally_value(&mut self, key: &str, label: &str, context: &str) -> Result<()> {
        let entry = self
            .extensions
            .entry(key.to_string())
            .or_insert_with(|| VocabularyEntry::Counts(Vec::new()));
        match entry {
            VocabularyEntry::Counts(counts) => {
                match counts.iter_mut().find(|count| count.label == label) {
                    Some(found) => found.count += 1,
                    None => counts.push(ValueCount {
                        label: label.to_string(),
                        count: 1,
                    }),
                }
                Ok(())
            }
            VocabularyEntry::Range { .. } => Err(CoreError::MalformedResource {
                context: context.to_string(),
                message: format!("{key} mixes coded values with a quantity range"),
            }),
        }
    }

    /// A quantity turns the entry into a widening range; earlier coded
    /// counts under the same key are discarded.
    fn record_quantity(&mut self, key: String, value: Number) {
        match self.extensions.get_mut(&key) {
            Some(VocabularyEntry::Range { min, max }) => {
                let candidate = value.as_f64().unwrap_or(f64::NAN);
                if min.as_f64().is_none_or(|current| candidate < current) {
                    *min = value.clone();
                }
                if max.as_f64().is_none_or(|current| candidate > current) {
                    *max = value;
                }
            }
            _ => {
                self.extensions.insert(
                    key,
                    VocabularyEntry::Range {
                        min: value.clone(),
                        max: value,
                    },
                );
            }
        }
    }

    fn components(&self) -> Vec<Value> {
        let mut components = Vec::new();
        for (key, tallies) in &self.codings {
            let Some(first) = tallies.first() else {
                continue;
            };
            components.push(json!({
                "code": {"coding": [
                    {"system": VOCABULARY_PATH_SYSTEM, "code": key, "display": key},
                    first.sample,
                ]},
                "valueInteger": first.count,
            }));
        }
        for (key, entry) in &self.extensions {
            let (path, system) = key.split_once('~').unwrap_or((key.as_str(), ""));
            match entry {
                VocabularyEntry::Counts(counts) => {
                    for count in counts {
                        components.push(json!({
                            "code": {"coding": [
                                {"system": system, "code": count.label, "display": count.label},
                                {"system": VOCABULARY_PATH_SYSTEM, "code": path, "display": path},
                            ]},
                            "valueInteger": count.count,
                        }));
                    }
                }
                VocabularyEntry::Range { min, max } => {
                    components.push(json!({
                        "code": {"coding": [
                            {"system": system, "code": "range", "display": "range"},
                            {"system": VOCABULARY_PATH_SYSTEM, "code": path, "display": path},
                        ]},
                        "valueRange": {"low": {"value": min}, "high": {"value": max}},
                    }));
                }
            }
        }
        components
    }
}

fn context_of(resource: &Resource) -> String {
    resource
        .type_and_id()
        .unwrap_or_else(|| "<unidentified resource>".to_string())
}
