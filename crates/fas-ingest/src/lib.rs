pub mod discovery;
pub mod error;
pub mod ndjson;

pub use discovery::{DiscoveredFile, input_file, list_ndjson_files, load_research_study_id};
pub use error::{IngestError, Result};
pub use ndjson::{NdjsonReader, read_resources, read_resources_by_id};
