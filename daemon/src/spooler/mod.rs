//! Boundary to the operating system's print spooler.
//!
//! Handles are plain owned values: dropping a [`ChangeSubscription`]
//! unregisters it and dropping a [`Printer`] closes it. A subscription must be
//! dropped before the printer it was created from.

use common::{JobDetails, JobId};
use std::time::Duration;
use thiserror::Error;

#[cfg(windows)]
mod windows;
#[cfg(test)]
pub mod mock;

#[cfg(windows)]
pub use self::windows::WinSpooler as PlatformSpooler;
#[cfg(not(windows))]
pub use self::unsupported::UnsupportedSpooler as PlatformSpooler;

/// Change filter bits for the notification subscription.
pub const CHANGE_ADD_JOB: u32 = 0x0000_0100;
pub const CHANGE_SET_JOB: u32 = 0x0000_0200;
pub const CHANGE_DELETE_JOB: u32 = 0x0000_0400;
pub const CHANGE_JOB_EVENTS: u32 = CHANGE_ADD_JOB | CHANGE_SET_JOB | CHANGE_DELETE_JOB;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpoolerError {
    #[error("Failed to open printer '{printer}': {reason}")]
    PrinterOpen { printer: String, reason: String },

    #[error("Printer change notification rejected: {0}")]
    Register(String),

    #[error("Change notification wait failed: {0}")]
    Wait(String),

    #[error("Change notification handle unusable: {0}")]
    WaitHandle(String),

    #[error("Job enumeration failed: {0}")]
    Enumerate(String),

    #[error("Printer monitoring is not supported on this platform")]
    Unsupported,
}

impl SpoolerError {
    /// Fatal errors end the monitor; everything else only costs the current wake.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SpoolerError::PrinterOpen { .. }
                | SpoolerError::Register(_)
                | SpoolerError::WaitHandle(_)
                | SpoolerError::Unsupported
        )
    }
}

/// Job fields a subscription asks the spooler to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobField {
    Status,
    Document,
    Other(u16),
}

impl JobField {
    pub fn is_status_or_document(&self) -> bool {
        matches!(self, JobField::Status | JobField::Document)
    }
}

/// One structured record delivered with a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRecord {
    pub job_id: JobId,
    pub field: JobField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    TimedOut,
    /// The spooler signalled; carries the raw change bitmask.
    Changed(u32),
    Failed(SpoolerError),
}

pub trait Spooler {
    type Printer: Printer;

    fn open(&self, printer_name: &str) -> Result<Self::Printer, SpoolerError>;
}

pub trait Printer {
    type Subscription: ChangeSubscription;

    fn subscribe(&self, change_mask: u32, fields: &[JobField]) -> Result<Self::Subscription, SpoolerError>;

    /// Details of a single job, `None` when the job is already gone.
    fn job_details(&self, job_id: JobId) -> Option<JobDetails>;

    /// Up to `max_jobs` jobs currently queued on the printer.
    fn enumerate_jobs(&self, max_jobs: u32) -> Result<Vec<(JobId, JobDetails)>, SpoolerError>;
}

pub trait ChangeSubscription {
    fn wait(&mut self, timeout: Duration) -> WaitOutcome;

    /// Structured records for the last `Changed` wake. `None` or an empty batch means the
    /// spooler had nothing usable and the caller should enumerate instead.
    fn fetch_change_info(&mut self) -> Option<Vec<ChangeRecord>>;
}

#[cfg(not(windows))]
mod unsupported {
    use super::*;

    /// Stand-in for platforms without a supported spooler API; every open fails.
    pub struct UnsupportedSpooler;

    pub enum NoPrinter {}
    pub enum NoSubscription {}

    impl Spooler for UnsupportedSpooler {
        type Printer = NoPrinter;

        fn open(&self, _printer_name: &str) -> Result<NoPrinter, SpoolerError> {
            Err(SpoolerError::Unsupported)
        }
    }

    impl Printer for NoPrinter {
        type Subscription = NoSubscription;

        fn subscribe(&self, _change_mask: u32, _fields: &[JobField]) -> Result<NoSubscription, SpoolerError> {
            match *self {}
        }

        fn job_details(&self, _job_id: JobId) -> Option<JobDetails> {
            match *self {}
        }

        fn enumerate_jobs(&self, _max_jobs: u32) -> Result<Vec<(JobId, JobDetails)>, SpoolerError> {
            match *self {}
        }
    }

    impl ChangeSubscription for NoSubscription {
        fn wait(&mut self, _timeout: Duration) -> WaitOutcome {
            match *self {}
        }

        fn fetch_change_info(&mut self) -> Option<Vec<ChangeRecord>> {
            match *self {}
        }
    }
}
