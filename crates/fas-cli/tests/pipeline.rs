//! End-to-end tests for the preparation pipeline.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use fas_core::{DEFAULT_STAGE_SPEC, PipelineRunner, RunSummary, RunnerConfig, StagePlan};

fn write_ndjson(dir: &Path, name: &str, resources: &[Value]) {
    let lines: Vec<String> = resources
        .iter()
        .map(|resource| serde_json::to_string(resource).unwrap())
        .collect();
    fs::write(dir.join(name), lines.join("\n")).unwrap();
}

fn read_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn run(input: &Path, output: &Path, spec: &str, seed: Option<&str>) -> RunSummary {
    let config = RunnerConfig {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        plan: StagePlan::parse(spec, seed).unwrap(),
        seed: seed.map(String::from),
        fail_fast: true,
    };
    PipelineRunner::new(config).run().unwrap()
}

fn part_of_study(study_id: &str) -> Value {
    json!({
        "url": "http://fhir-aggregator.org/fhir/StructureDefinition/part-of-study",
        "valueReference": {"reference": format!("ResearchStudy/{study_id}")},
    })
}

fn study_fixture(dir: &Path) {
    write_ndjson(
        dir,
        "ResearchStudy.ndjson",
        &[json!({
            "resourceType": "ResearchStudy",
            "id": "study-1",
            "status": "active",
            "extension": [part_of_study("study-1")],
        })],
    );
    write_ndjson(
        dir,
        "Patient.ndjson",
        &[json!({"resourceType": "Patient", "id": "p1"})],
    );
    write_ndjson(
        dir,
        "Specimen.ndjson",
        &[json!({
            "resourceType": "Specimen",
            "id": "s1",
            "subject": {"reference": "Patient/p1"},
            "type": {"coding": [
                {"system": "http://snomed.info/sct", "code": "119376003", "display": "Tissue specimen"},
            ]},
        })],
    );
}

#[test]
fn default_stages_produce_a_closed_r4b_bundle() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    study_fixture(input.path());
    write_ndjson(
        input.path(),
        "Group.ndjson",
        &[json!({
            "resourceType": "Group",
            "id": "g1",
            "membership": "definitional",
            "member": [{"entity": {"reference": "Specimen/s1"}}],
            "extension": [part_of_study("study-1")],
        })],
    );
    write_ndjson(
        input.path(),
        "DocumentReference.ndjson",
        &[json!({
            "resourceType": "DocumentReference",
            "id": "d1",
            "status": "current",
            "version": "3",
            "subject": {"reference": "Group/g1"},
            "content": [{"attachment": {"title": "sample.vcf", "size": 1024}}],
        })],
    );

    let summary = run(input.path(), output.path(), DEFAULT_STAGE_SPEC, None);

    assert_eq!(summary.assays_synthesized, 1);
    assert_eq!(summary.vocabulary_studies, 1);
    assert_eq!(summary.emitted.get("ServiceRequest"), Some(&1));
    assert_eq!(summary.emitted.get("DocumentReference"), Some(&1));
    assert_eq!(summary.emitted.get("Observation"), Some(&1));
    // The joined group is consumed by the assay, not emitted.
    assert!(!summary.emitted.contains_key("Group"));

    let documents = read_lines(&output.path().join("DocumentReference.ndjson"));
    let document = &documents[0];
    assert_eq!(document["subject"]["reference"], "Patient/p1");
    assert!(document.get("version").is_none());
    let related: Vec<&str> = document["context"]["related"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["reference"].as_str().unwrap())
        .collect();
    assert_eq!(related, ["ServiceRequest/g1", "Specimen/s1"]);
    assert_eq!(
        document["content"][0]["attachment"]["contentType"],
        "text/tab-separated-values+vcf"
    );

    let assays = read_lines(&output.path().join("ServiceRequest.ndjson"));
    let assay = &assays[0];
    assert_eq!(assay["id"], "g1");
    assert_eq!(assay["subject"]["reference"], "Patient/p1");
    assert_eq!(assay["specimen"][0]["reference"], "Specimen/s1");
    // R4B shape: code.coding, not the R5 code.concept nesting.
    assert!(assay["code"]["coding"].is_array());

    let observations = read_lines(&output.path().join("Observation.ndjson"));
    let components = observations[0]["component"].as_array().unwrap();
    let specimen_type = components
        .iter()
        .find(|component| component["code"]["coding"][0]["code"] == "Specimen.type")
        .expect("Specimen.type component");
    assert_eq!(specimen_type["valueInteger"], 1);
}

#[test]
fn reseed_is_deterministic_per_seed() {
    let input = tempfile::tempdir().unwrap();
    study_fixture(input.path());

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();
    run(input.path(), first.path(), "part-of,validate,reseed", Some("alpha"));
    run(input.path(), second.path(), "part-of,validate,reseed", Some("alpha"));
    run(input.path(), other.path(), "part-of,validate,reseed", Some("beta"));

    let first_specimens = fs::read_to_string(first.path().join("Specimen.ndjson")).unwrap();
    let second_specimens = fs::read_to_string(second.path().join("Specimen.ndjson")).unwrap();
    let other_specimens = fs::read_to_string(other.path().join("Specimen.ndjson")).unwrap();
    assert_eq!(first_specimens, second_specimens);
    assert_ne!(first_specimens, other_specimens);
    assert!(!first_specimens.contains(r#""id":"s1""#));

    // Ids and references move together: the reseeded specimen still points at
    // the reseeded patient.
    let specimen = &read_lines(&first.path().join("Specimen.ndjson"))[0];
    let patient = &read_lines(&first.path().join("Patient.ndjson"))[0];
    assert_eq!(
        specimen["subject"]["reference"].as_str().unwrap(),
        format!("Patient/{}", patient["id"].as_str().unwrap())
    );
}

#[test]
fn specimen_document_gets_its_own_assay_and_content_type() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    study_fixture(input.path());
    write_ndjson(
        input.path(),
        "DocumentReference.ndjson",
        &[json!({
            "resourceType": "DocumentReference",
            "id": "d1",
            "status": "current",
            "subject": {"reference": "Specimen/s1"},
            "content": [{"attachment": {"title": "report.pdf"}}],
            "extension": [part_of_study("study-1")],
        })],
    );

    let summary = run(input.path(), output.path(), "assay,part-of,r4", None);

    assert_eq!(summary.assays_synthesized, 1);
    let documents = read_lines(&output.path().join("DocumentReference.ndjson"));
    assert_eq!(documents[0]["subject"]["reference"], "Patient/p1");
    assert_eq!(
        documents[0]["content"][0]["attachment"]["contentType"],
        "application/pdf"
    );
    let assays = read_lines(&output.path().join("ServiceRequest.ndjson"));
    assert_eq!(assays[0]["specimen"][0]["reference"], "Specimen/s1");
}
