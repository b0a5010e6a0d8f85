use crate::dedup::ActiveJobs;
use crate::fetcher;
use crate::sink::Sink;
use crate::spooler::{
    ChangeRecord, ChangeSubscription, JobField, Printer, Spooler, SpoolerError, WaitOutcome, CHANGE_JOB_EVENTS,
};
use chrono::NaiveDateTime;
use common::{JobDetails, JobId, JobSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const WATCHED_FIELDS: [JobField; 2] = [JobField::Status, JobField::Document];

/// Cooperative stop request shared between the caller and the monitor thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub printer_name: String,
    /// Upper bound on a single wait; also the worst-case stop latency.
    pub wait_timeout: Duration,
    pub enum_max_jobs: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            printer_name: common::DEFAULT_PRINTER.to_string(),
            wait_timeout: Duration::from_millis(common::DEFAULT_WAIT_TIMEOUT_MS),
            enum_max_jobs: common::DEFAULT_ENUM_MAX_JOBS,
        }
    }
}

/// Counters collected over one monitor run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub wakes: u64,
    pub timeouts: u64,
    pub wait_errors: u64,
    pub fallback_scans: u64,
    pub jobs_logged: u64,
    pub jobs_skipped: u64,
    pub captures: u64,
}

pub type Clock = Box<dyn Fn() -> NaiveDateTime + Send>;

pub fn local_clock() -> Clock {
    Box::new(|| chrono::Local::now().naive_local())
}

pub struct Monitor<S: Spooler> {
    spooler: S,
    settings: MonitorSettings,
    sink: Sink,
    active: ActiveJobs,
    clock: Clock,
    report: MonitorReport,
}

impl<S: Spooler> Monitor<S> {
    pub fn new(spooler: S, settings: MonitorSettings, sink: Sink) -> Self {
        Self::with_clock(spooler, settings, sink, local_clock())
    }

    pub fn with_clock(spooler: S, settings: MonitorSettings, sink: Sink, clock: Clock) -> Self {
        Self {
            spooler,
            settings,
            sink,
            active: ActiveJobs::new(),
            clock,
            report: MonitorReport::default(),
        }
    }

    /// Watch the printer until `cancel` is set or a fatal spooler error occurs.
    ///
    /// The printer and subscription handles are released before this returns,
    /// on every path.
    pub fn run(mut self, cancel: &CancelToken) -> Result<MonitorReport, SpoolerError> {
        let printer = self.spooler.open(&self.settings.printer_name)?;
        let mut subscription = printer.subscribe(CHANGE_JOB_EVENTS, &WATCHED_FIELDS)?;
        log::info!("Monitoring printer: {}", self.settings.printer_name);

        while !cancel.is_cancelled() {
            match subscription.wait(self.settings.wait_timeout) {
                WaitOutcome::TimedOut => {
                    self.report.timeouts += 1;
                }
                WaitOutcome::Changed(change) => {
                    self.report.wakes += 1;
                    log::debug!("Printer event triggered, change={:#x}", change);
                    let records = subscription.fetch_change_info();
                    self.process_wake(&printer, records);
                }
                WaitOutcome::Failed(e) if e.is_fatal() => {
                    log::warn!("Stopping monitor: {}", e);
                    return Err(e);
                }
                WaitOutcome::Failed(e) => {
                    self.report.wait_errors += 1;
                    log::debug!("Skipping change: {}", e);
                }
            }
        }

        log::info!(
            "Monitor for {} stopped, {} job id(s) seen",
            self.settings.printer_name,
            self.active.len()
        );
        Ok(self.report)
    }

    fn process_wake(&mut self, printer: &S::Printer, records: Option<Vec<ChangeRecord>>) {
        // Empty batch counts as no info.
        let Some(records) = records.filter(|r| !r.is_empty()) else {
            self.scan_queue(printer);
            return;
        };

        for record in records.iter().filter(|r| r.field.is_status_or_document()) {
            if !self.active.is_new(record.job_id) {
                continue;
            }
            log::info!("New print job detected, job id {}", record.job_id);
            match fetcher::details_for(printer, record.job_id) {
                Some(details) => self.record_job(record.job_id, &details, JobSource::Event),
                None => self.report.jobs_skipped += 1,
            }
        }
    }

    fn scan_queue(&mut self, printer: &S::Printer) {
        self.report.fallback_scans += 1;
        match fetcher::enumerate_new(printer, &mut self.active, self.settings.enum_max_jobs) {
            Ok(jobs) => {
                for (job_id, details) in jobs {
                    self.record_job(job_id, &details, JobSource::EnumFallback);
                }
            }
            Err(e) => log::warn!("{}", e),
        }
    }

    /// Log and capture are independent: a failed capture never drops the line.
    fn record_job(&mut self, job_id: JobId, details: &JobDetails, source: JobSource) {
        let now = (self.clock)();

        match self.sink.log_job(details, now, source) {
            Ok(()) => self.report.jobs_logged += 1,
            Err(e) => log::warn!("Job {} ({}): {:#}", job_id, source.tag(), e),
        }
        match self.sink.capture_screen(now) {
            Ok(Some(_)) => self.report.captures += 1,
            Ok(None) => {}
            Err(e) => log::warn!("Job {} capture failed: {:#}", job_id, e),
        }
    }
}
