//! Input directory discovery.
//!
//! A study directory holds one `<ResourceType>.ndjson` file per resource
//! type, plus exactly one `ResearchStudy.ndjson` whose first line supplies
//! the governing study id.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use fas_model::Resource;

use crate::error::{IngestError, Result};

/// A discovered per-type NDJSON input file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path to the NDJSON file.
    pub path: PathBuf,
    /// Resource type derived from the filename stem.
    pub resource_type: String,
}

/// List the `*.ndjson` files in a study directory, sorted by filename.
pub fn list_ndjson_files(dir: &Path) -> Result<Vec<DiscoveredFile>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_ndjson = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ndjson"));
        if !is_ndjson {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        files.push(DiscoveredFile {
            resource_type: stem.to_string(),
            path,
        });
    }
    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    debug!(dir = %dir.display(), file_count = files.len(), "discovered input files");
    Ok(files)
}

/// Path of the per-type input file for a resource type.
#[must_use]
pub fn input_file(dir: &Path, resource_type: &str) -> PathBuf {
    dir.join(format!("{resource_type}.ndjson"))
}

/// Read the governing study id from the first line of
/// `ResearchStudy.ndjson`.
pub fn load_research_study_id(dir: &Path) -> Result<String> {
    let path = input_file(dir, "ResearchStudy");
    let file = File::open(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            IngestError::MissingFile { path: path.clone() }
        } else {
            IngestError::FileRead {
                path: path.clone(),
                source,
            }
        }
    })?;
    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|source| IngestError::FileRead {
            path: path.clone(),
            source,
        })?;
    let resource =
        Resource::from_json_line(&first_line).map_err(|error| IngestError::Malformed {
            path: path.clone(),
            line: 1,
            message: error.to_string(),
        })?;
    resource
        .id()
        .map(str::to_string)
        .ok_or_else(|| IngestError::Malformed {
            path,
            line: 1,
            message: "ResearchStudy has no id".to_string(),
        })
}
