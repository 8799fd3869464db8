use std::fmt;

/// Target FHIR schema version for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FhirVersion {
    /// Older shape expected by the aggregation service.
    R4B,
    /// Shape the input files arrive in.
    #[default]
    R5,
}

impl FhirVersion {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::R4B => "R4B",
            Self::R5 => "R5",
        }
    }
}

impl fmt::Display for FhirVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
