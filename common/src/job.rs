use serde::{Deserialize, Serialize};

/// Identifier the print spooler assigns to a job. Unique per printer while the
/// job exists; the spooler may hand it out again once the job is purged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u32);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobDetails {
    pub document_name: String,
    pub printer_name: String,
    pub page_count: u32,
}

/// Which detection path discovered a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobSource {
    Event,
    EnumFallback,
}

impl JobSource {
    pub fn tag(&self) -> &'static str {
        match self {
            JobSource::Event => "event",
            JobSource::EnumFallback => "enum-fallback",
        }
    }
}
