use chrono::NaiveDateTime;
use crate::job::{JobDetails, JobSource};

const LINE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";
const CAPTURE_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// One line of the append-only print log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry<'a> {
    pub timestamp: NaiveDateTime,
    pub details: &'a JobDetails,
    pub source: JobSource,
}

impl<'a> LogEntry<'a> {
    pub fn new(details: &'a JobDetails, timestamp: NaiveDateTime, source: JobSource) -> Self {
        Self { timestamp, details, source }
    }

    /// Render the line without its trailing newline.
    ///
    /// Event-path entries look like
    /// `[2024-01-01 10:00:00] Printed: Invoice.pdf on LP1 (3 pages)`;
    /// enumeration-fallback entries carry an `[Enum] ` prefix and an
    /// unbracketed timestamp.
    pub fn to_line(&self) -> String {
        let ts = self.timestamp.format(LINE_TIMESTAMP);
        let body = format!(
            "Printed: {} on {} ({} pages)",
            self.details.document_name, self.details.printer_name, self.details.page_count
        );
        match self.source {
            JobSource::Event => format!("[{}] {}", ts, body),
            JobSource::EnumFallback => format!("[Enum] {} {}", ts, body),
        }
    }
}

impl std::fmt::Display for LogEntry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Base file name (with `.png`) of the capture taken at `timestamp`.
pub fn capture_file_name(timestamp: NaiveDateTime) -> String {
    format!("{}.png", timestamp.format(CAPTURE_TIMESTAMP))
}
