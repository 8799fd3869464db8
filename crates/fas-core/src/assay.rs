//! Synthetic assay construction.
//!
//! Sequencing runs arrive as a DocumentReference per output file, a Group
//! per sample batch, and a Specimen per sample. The aggregation service
//! wants a ServiceRequest ("assay") joining the three: one patient subject,
//! the specimen list, and the covered documents pointing back at it. The
//! synthesizer performs that join and rewrites each covered document's
//! subject to the resolved patient.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Value, json};
use tracing::{debug, warn};

use fas_model::{
    FhirVersion, Resource, document_assay_id, part_of_study_extension, reference_id,
    research_study_id,
};
use fas_transform::update_mime_type;

use crate::error::{CoreError, Result};

const SNOMED_SYSTEM: &str = "http://snomed.info/sct";

const ASSAY_NARRATIVE: &str = "<div xmlns=\"http://www.w3.org/1999/xhtml\">Autogenerated Assay. \
     Packages references to Subject, Specimen and DocumentReference</div>";

/// Resources produced by the assay phase, in emit order: assays first, then
/// the rewritten documents, then groups no assay absorbed.
#[derive(Debug)]
pub struct AssayOutput {
    pub resources: Vec<Resource>,
    pub assay_count: usize,
}

/// Joins DocumentReference, Group and Specimen collections into synthetic
/// assay ServiceRequests.
#[derive(Debug, Clone, Copy)]
pub struct AssaySynthesizer {
    version: FhirVersion,
}

impl AssaySynthesizer {
    #[must_use]
    pub fn new(version: FhirVersion) -> Self {
        Self { version }
    }

    pub fn synthesize(
        &self,
        mut documents: Vec<Resource>,
        groups: Vec<Resource>,
        specimens: &BTreeMap<String, Resource>,
    ) -> Result<AssayOutput> {
        let mut documents_by_group: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, document) in documents.iter().enumerate() {
            let subject = subject_reference(document)?;
            let Some(subject_id) = reference_id(&subject) else {
                return Err(CoreError::MalformedResource {
                    context: context_of(document),
                    message: format!("subject reference {subject:?} has no id segment"),
                });
            };
            documents_by_group
                .entry(subject_id.to_string())
                .or_default()
                .push(index);
        }

        let had_groups = !groups.is_empty();
        let mut assays = Vec::new();
        let mut joined_groups: BTreeSet<String> = BTreeSet::new();

        for group in &groups {
            let Some((patient, specimen_references)) = group_join(group, specimens)? else {
                continue;
            };
            let group_id = group.id().ok_or_else(|| CoreError::MalformedResource {
                context: context_of(group),
                message: "group has no id".to_string(),
            })?;
            joined_groups.insert(group_id.to_string());
            let study_id = research_study_id(group)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| CoreError::GroupWithoutStudy {
                    group_id: group_id.to_string(),
                })?;
            let mut assay =
                self.build_assay(group_id, &patient, &specimen_references, &study_id)?;
            // the group's own extension list replaces the template's
            assay.insert(
                "extension",
                Value::Array(group.extensions().cloned().unwrap_or_default()),
            );
            let assay_reference = format!("ServiceRequest/{group_id}");
            if let Some(indices) = documents_by_group.get(group_id) {
                for &index in indices {
                    self.refactor_document(
                        &mut documents[index],
                        &assay_reference,
                        &patient,
                        &specimen_references,
                    )?;
                }
            }
            assays.push(assay);
        }

        let leftover_groups: Vec<Resource> = groups
            .into_iter()
            .filter(|group| group.id().is_none_or(|id| !joined_groups.contains(id)))
            .collect();

        if had_groups {
            let mut unresolved = Vec::new();
            for document in &documents {
                let subject = subject_reference(document)?;
                if !subject.starts_with("Patient/") {
                    unresolved.push(format!(
                        "{} -> {subject}",
                        document.id().unwrap_or("<no id>")
                    ));
                }
            }
            if unresolved.len() != leftover_groups.len() {
                return Err(CoreError::UnbalancedAssayJoin {
                    summary: format!(
                        "{} documents without patient subjects vs {} leftover groups: {}",
                        unresolved.len(),
                        leftover_groups.len(),
                        unresolved.join(", ")
                    ),
                });
            }
        }

        for index in 0..documents.len() {
            let (study_id, subject, document_id) = {
                let document = &documents[index];
                let Some(study_id) = research_study_id(document).filter(|id| !id.is_empty())
                else {
                    warn!(
                        document = %context_of(document),
                        "document does not reference a ResearchStudy, skipping assay creation"
                    );
                    continue;
                };
                let subject = subject_reference(document)?;
                let document_id = document
                    .id()
                    .ok_or_else(|| CoreError::MalformedResource {
                        context: context_of(document),
                        message: "document has no id".to_string(),
                    })?
                    .to_string();
                (study_id, subject, document_id)
            };
            let Some(specimen_id) = subject.strip_prefix("Specimen/") else {
                continue;
            };
            let specimen =
                specimens
                    .get(specimen_id)
                    .ok_or_else(|| CoreError::SpecimenNotFound {
                        specimen_id: specimen_id.to_string(),
                        document_id: document_id.clone(),
                    })?;
            let patient = subject_reference(specimen)?;
            let specimen_references = vec![subject.clone()];
            let assay_id = document_assay_id(&document_id);
            let assay = self.build_assay(&assay_id, &patient, &specimen_references, &study_id)?;
            self.refactor_document(
                &mut documents[index],
                &format!("ServiceRequest/{assay_id}"),
                &patient,
                &specimen_references,
            )?;
            let rewritten = subject_reference(&documents[index])?;
            if !rewritten.starts_with("Patient/") {
                return Err(CoreError::MalformedResource {
                    context: format!("DocumentReference/{document_id}"),
                    message: format!("document subject is not a patient: {rewritten}"),
                });
            }
            assays.push(assay);
        }

        let assay_count = assays.len();
        debug!(
            assays = assay_count,
            documents = documents.len(),
            leftover_groups = leftover_groups.len(),
            "assay synthesis complete"
        );
        let mut resources = assays;
        resources.extend(documents);
        resources.extend(leftover_groups);
        Ok(AssayOutput {
            resources,
            assay_count,
        })
    }

    fn build_assay(
        &self,
        assay_id: &str,
        patient: &str,
        specimen_references: &[String],
        study_id: &str,
    ) -> Result<Resource> {
        let specimen: Vec<Value> = specimen_references
            .iter()
            .map(|reference| json!({"reference": reference}))
            .collect();
        let laboratory_test = json!({
            "system": SNOMED_SYSTEM,
            "code": "15220000",
            "display": "Laboratory test",
        });
        let code = if self.version == FhirVersion::R5 {
            json!({"concept": {"coding": [laboratory_test]}})
        } else {
            json!({"coding": [laboratory_test]})
        };
        let resource = Resource::from_value(json!({
            "resourceType": "ServiceRequest",
            "id": assay_id,
            "status": "completed",
            "intent": "order",
            "category": [{"coding": [{
                "system": SNOMED_SYSTEM,
                "code": "108252007",
                "display": "Laboratory procedure",
            }]}],
            "code": code,
            "subject": {"reference": patient},
            "text": {
                "status": "generated",
                "div": ASSAY_NARRATIVE,
            },
            "specimen": specimen,
            "extension": [part_of_study_extension(study_id)],
        }))?;
        Ok(resource)
    }

    /// Point a covered document at its patient and assay.
    ///
    /// The R5 shape takes the assay in `basedOn` and a stringified
    /// attachment size; the R4B shape loses `version` and `content[0]
    /// .profile` and takes the assay plus specimen references in
    /// `context.related`. The attachment content type is recomputed either
    /// way.
    fn refactor_document(
        &self,
        document: &mut Resource,
        assay_reference: &str,
        patient: &str,
        specimen_references: &[String],
    ) -> Result<()> {
        document.insert("subject", json!({"reference": patient}));
        if self.version == FhirVersion::R5 {
            match document.get_mut("basedOn").and_then(Value::as_array_mut) {
                Some(based_on) => based_on.push(json!({"reference": assay_reference})),
                None => document.insert("basedOn", json!([{"reference": assay_reference}])),
            }
            if let Some(size) = document
                .get_mut("content")
                .and_then(|content| content.get_mut(0))
                .and_then(|entry| entry.get_mut("attachment"))
                .and_then(|attachment| attachment.get_mut("size"))
                && !size.is_string()
            {
                let text = match size {
                    Value::Number(number) => number.to_string(),
                    ref other => other.to_string(),
                };
                *size = Value::String(text);
            }
        } else {
            document.remove("version");
            if let Some(entry) = document
                .get_mut("content")
                .and_then(|content| content.get_mut(0))
                .and_then(Value::as_object_mut)
            {
                entry.shift_remove("profile");
            }
            let mut related: Vec<Value> = vec![json!({"reference": assay_reference})];
            related.extend(
                specimen_references
                    .iter()
                    .map(|reference| json!({"reference": reference})),
            );
            match document.get_mut("context").and_then(Value::as_object_mut) {
                Some(context) => match context.get_mut("related").and_then(Value::as_array_mut) {
                    Some(existing) => existing.extend(related),
                    None => {
                        context.insert("related".to_string(), Value::Array(related));
                    }
                },
                None => document.insert("context", json!({"related": related})),
            }
        }
        update_mime_type(document)?;
        Ok(())
    }
}

/// Specimen references and the resolved patient for one group.
///
/// Specimen references are kept even when the specimen itself is missing;
/// the patient comes from the last resolvable specimen's subject. `None`
/// when the group yields no patient or no specimen references.
fn group_join(
    group: &Resource,
    specimens: &BTreeMap<String, Resource>,
) -> Result<Option<(String, Vec<String>)>> {
    let mut patient = None;
    let mut specimen_references = Vec::new();
    let members = group.get("member").and_then(Value::as_array);
    for member in members.into_iter().flatten() {
        let Some(reference) = member
            .get("entity")
            .and_then(|entity| entity.get("reference"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        let Some(specimen_id) = reference.strip_prefix("Specimen/") else {
            continue;
        };
        specimen_references.push(reference.to_string());
        if let Some(specimen) = specimens.get(specimen_id) {
            patient = Some(subject_reference(specimen)?);
        }
    }
    match patient {
        Some(patient) if !specimen_references.is_empty() => {
            Ok(Some((patient, specimen_references)))
        }
        _ => Ok(None),
    }
}

fn subject_reference(resource: &Resource) -> Result<String> {
    resource
        .get("subject")
        .and_then(|subject| subject.get("reference"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CoreError::MalformedResource {
            context: context_of(resource),
            message: "resource has no subject.reference".to_string(),
        })
}

fn context_of(resource: &Resource) -> String {
    resource
        .type_and_id()
        .unwrap_or_else(|| "<unidentified resource>".to_string())
}
