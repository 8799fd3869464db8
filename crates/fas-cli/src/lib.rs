//! CLI library components for the FHIR preparation pipeline.

pub mod logging;
