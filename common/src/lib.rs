pub mod entry;
pub mod job;

pub use entry::{capture_file_name, LogEntry};
pub use job::{JobDetails, JobId, JobSource};

/// Folder under the user's home directory that receives the print log and captures.
pub const LOG_DIR_NAME: &str = "PrintedLogs";
pub const LOG_FILE_NAME: &str = "print_log.txt";

pub const DEFAULT_PRINTER: &str = "Foxit PDF Editor Printer";
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_ENUM_MAX_JOBS: u32 = 10;
