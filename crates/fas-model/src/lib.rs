pub mod error;
pub mod extension;
pub mod ids;
pub mod path_search;
pub mod reference;
pub mod resource;
pub mod version;

pub use error::{FasError, Result};
pub use extension::{
    PART_OF_STUDY_URL, has_part_of_study, part_of_study_extension, research_study_id,
};
pub use ids::{deterministic_id, document_assay_id, reseeded_id, vocabulary_observation_id};
pub use path_search::{PathMatch, PathSegment, find_key, value_at_path};
pub use reference::{Reference, reference_id, split_reference};
pub use resource::Resource;
pub use version::FhirVersion;
