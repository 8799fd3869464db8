//! Lazily opened per-type NDJSON writers.
//!
//! Output mirrors the input layout: one `<ResourceType>.ndjson` file per
//! resource type. Files are created on the first emit for that type, so
//! types that produce no output leave no file behind.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use fas_model::Resource;

use crate::error::{OutputError, Result};

struct Emitter {
    path: PathBuf,
    writer: BufWriter<File>,
    count: usize,
}

/// Set of per-type NDJSON writers rooted at one output directory.
pub struct EmitterSet {
    output_dir: PathBuf,
    emitters: BTreeMap<String, Emitter>,
}

impl EmitterSet {
    /// Create the output directory and an empty emitter set.
    pub fn create(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir).map_err(|source| OutputError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            emitters: BTreeMap::new(),
        })
    }

    /// Path of the per-type output file for a resource type.
    #[must_use]
    pub fn output_file(&self, resource_type: &str) -> PathBuf {
        self.output_dir.join(format!("{resource_type}.ndjson"))
    }

    /// Append one resource to the file for its declared type.
    ///
    /// A resource with no `resourceType` lands in `Unknown.ndjson` rather
    /// than being dropped silently.
    pub fn emit(&mut self, resource: &Resource) -> Result<()> {
        let resource_type = resource.resource_type().unwrap_or("Unknown").to_string();
        let line = resource
            .to_json_line()
            .map_err(|source| OutputError::Serialize {
                type_and_id: resource
                    .type_and_id()
                    .unwrap_or_else(|| "<unidentified>".to_string()),
                source,
            })?;
        let emitter = match self.emitters.get_mut(&resource_type) {
            Some(emitter) => emitter,
            None => {
                let path = self.output_file(&resource_type);
                let file = File::create(&path).map_err(|source| OutputError::FileCreate {
                    path: path.clone(),
                    source,
                })?;
                debug!(path = %path.display(), "opened output file");
                self.emitters.entry(resource_type).or_insert(Emitter {
                    path,
                    writer: BufWriter::new(file),
                    count: 0,
                })
            }
        };
        writeln!(emitter.writer, "{line}").map_err(|source| OutputError::Write {
            path: emitter.path.clone(),
            source,
        })?;
        emitter.count += 1;
        Ok(())
    }

    /// Resource types that have received at least one emit.
    #[must_use]
    pub fn emitted_types(&self) -> Vec<String> {
        self.emitters.keys().cloned().collect()
    }

    /// Flush and close every writer, returning per-type emit counts.
    pub fn finish(self) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for (resource_type, mut emitter) in self.emitters {
            emitter
                .writer
                .flush()
                .map_err(|source| OutputError::Write {
                    path: emitter.path.clone(),
                    source,
                })?;
            counts.insert(resource_type, emitter.count);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(resource_type: &str, id: &str) -> Resource {
        Resource::from_value(json!({"resourceType": resource_type, "id": id})).expect("resource")
    }

    #[test]
    fn creates_files_lazily_per_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut emitters = EmitterSet::create(dir.path()).expect("create");
        emitters.emit(&resource("Patient", "p1")).expect("emit");
        emitters.emit(&resource("Specimen", "s1")).expect("emit");
        emitters.emit(&resource("Patient", "p2")).expect("emit");

        assert!(!dir.path().join("Observation.ndjson").exists());
        let counts = emitters.finish().expect("finish");
        assert_eq!(counts["Patient"], 2);
        assert_eq!(counts["Specimen"], 1);

        let patients = std::fs::read_to_string(dir.path().join("Patient.ndjson")).expect("read");
        assert_eq!(patients.lines().count(), 2);
    }

    #[test]
    fn nested_output_directory_is_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("out").join("META");
        let mut emitters = EmitterSet::create(&nested).expect("create");
        emitters.emit(&resource("Group", "g1")).expect("emit");
        emitters.finish().expect("finish");
        assert!(nested.join("Group.ndjson").exists());
    }

    #[test]
    fn untyped_resource_goes_to_unknown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut emitters = EmitterSet::create(dir.path()).expect("create");
        let untyped = Resource::from_value(json!({"id": "x"})).expect("resource");
        emitters.emit(&untyped).expect("emit");
        let counts = emitters.finish().expect("finish");
        assert_eq!(counts["Unknown"], 1);
    }

    #[test]
    fn emitted_types_tracks_open_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut emitters = EmitterSet::create(dir.path()).expect("create");
        emitters.emit(&resource("Patient", "p1")).expect("emit");
        assert_eq!(emitters.emitted_types(), vec!["Patient".to_string()]);
    }
}
