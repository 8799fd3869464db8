//! Streaming NDJSON readers.
//!
//! Input files hold one JSON resource per line. The streaming reader never
//! materializes more than one line at a time, so per-type files of any size
//! can be threaded through the pipeline. Blank lines are skipped.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use serde_json::Value;

use fas_model::Resource;

use crate::error::{IngestError, Result};

/// Line-by-line reader yielding one resource per NDJSON line.
pub struct NdjsonReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl NdjsonReader {
    /// Open an NDJSON file for streaming.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                IngestError::MissingFile {
                    path: path.to_path_buf(),
                }
            } else {
                IngestError::FileRead {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }

    /// The file being read, for diagnostics.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for NdjsonReader {
    type Item = Result<Resource>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(IngestError::FileRead {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = match serde_json::from_str(line.trim()) {
                Ok(value) => value,
                Err(source) => {
                    return Some(Err(IngestError::Json {
                        path: self.path.clone(),
                        line: self.line_number,
                        source,
                    }));
                }
            };
            return Some(Resource::from_value(value).map_err(|error| IngestError::Malformed {
                path: self.path.clone(),
                line: self.line_number,
                message: error.to_string(),
            }));
        }
    }
}

/// Read a whole NDJSON file into memory.
pub fn read_resources(path: &Path) -> Result<Vec<Resource>> {
    NdjsonReader::open(path)?.collect()
}

/// Read a whole NDJSON file keyed by resource id.
///
/// Later lines with a duplicate id replace earlier ones. A resource without
/// an id is malformed.
pub fn read_resources_by_id(path: &Path) -> Result<BTreeMap<String, Resource>> {
    let mut by_id = BTreeMap::new();
    for (index, resource) in NdjsonReader::open(path)?.enumerate() {
        let resource = resource?;
        let Some(id) = resource.id().map(str::to_string) else {
            return Err(IngestError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
                message: "resource has no id".to_string(),
            });
        };
        by_id.insert(id, resource);
    }
    Ok(by_id)
}
