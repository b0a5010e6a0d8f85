//! Scripted in-memory spooler for exercising the monitor loop.

use super::{ChangeRecord, ChangeSubscription, JobField, Printer, Spooler, SpoolerError, WaitOutcome};
use crate::monitor::CancelToken;
use common::{JobDetails, JobId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a single wake of the subscription delivers.
#[derive(Debug, Clone)]
pub enum MockWake {
    Records(Vec<ChangeRecord>),
    NoInfo,
    WaitError,
    HandleLost,
    /// Queue a job on the printer without signalling.
    Submit(JobId, JobDetails),
    /// Remove a job from the printer without signalling.
    Purge(JobId),
}

#[derive(Default)]
pub struct MockState {
    pub printers: Vec<String>,
    pub jobs: HashMap<JobId, JobDetails>,
    pub script: VecDeque<MockWake>,
    pub refuse_subscribe: bool,
    pub open_printers: usize,
    pub open_subscriptions: usize,
    pub enum_calls: usize,
    pub wait_calls: usize,
    /// Cancelled once the script runs dry, so tests end deterministically.
    pub cancel_when_drained: Option<CancelToken>,
}

#[derive(Clone, Default)]
pub struct MockSpooler {
    pub state: Arc<Mutex<MockState>>,
}

impl MockSpooler {
    pub fn with_printer(name: &str) -> Self {
        let spooler = Self::default();
        spooler.state.lock().unwrap().printers.push(name.to_string());
        spooler
    }

    pub fn add_job(&self, id: u32, document: &str, printer: &str, pages: u32) {
        self.state.lock().unwrap().jobs.insert(JobId(id), details(document, printer, pages));
    }

    pub fn push(&self, wake: MockWake) {
        self.state.lock().unwrap().script.push_back(wake);
    }

    pub fn cancel_when_drained(&self, token: &CancelToken) {
        self.state.lock().unwrap().cancel_when_drained = Some(token.clone());
    }
}

pub fn details(document: &str, printer: &str, pages: u32) -> JobDetails {
    JobDetails {
        document_name: document.to_string(),
        printer_name: printer.to_string(),
        page_count: pages,
    }
}

pub fn status_change(id: u32) -> ChangeRecord {
    ChangeRecord { job_id: JobId(id), field: JobField::Status }
}

pub fn document_change(id: u32) -> ChangeRecord {
    ChangeRecord { job_id: JobId(id), field: JobField::Document }
}

impl Spooler for MockSpooler {
    type Printer = MockPrinter;

    fn open(&self, printer_name: &str) -> Result<MockPrinter, SpoolerError> {
        let mut state = self.state.lock().unwrap();
        if !state.printers.iter().any(|p| p == printer_name) {
            return Err(SpoolerError::PrinterOpen {
                printer: printer_name.to_string(),
                reason: "no such printer".to_string(),
            });
        }
        state.open_printers += 1;
        Ok(MockPrinter { state: self.state.clone() })
    }
}

pub struct MockPrinter {
    state: Arc<Mutex<MockState>>,
}

impl Drop for MockPrinter {
    fn drop(&mut self) {
        self.state.lock().unwrap().open_printers -= 1;
    }
}

impl Printer for MockPrinter {
    type Subscription = MockSubscription;

    fn subscribe(&self, _change_mask: u32, _fields: &[JobField]) -> Result<MockSubscription, SpoolerError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_subscribe {
            return Err(SpoolerError::Register("access denied".to_string()));
        }
        state.open_subscriptions += 1;
        Ok(MockSubscription { state: self.state.clone(), pending: None })
    }

    fn job_details(&self, job_id: JobId) -> Option<JobDetails> {
        self.state.lock().unwrap().jobs.get(&job_id).cloned()
    }

    fn enumerate_jobs(&self, max_jobs: u32) -> Result<Vec<(JobId, JobDetails)>, SpoolerError> {
        let mut state = self.state.lock().unwrap();
        state.enum_calls += 1;
        let mut jobs: Vec<_> = state.jobs.iter().map(|(id, d)| (*id, d.clone())).collect();
        jobs.sort_by_key(|(id, _)| *id);
        jobs.truncate(max_jobs as usize);
        Ok(jobs)
    }
}

pub struct MockSubscription {
    state: Arc<Mutex<MockState>>,
    pending: Option<Vec<ChangeRecord>>,
}

impl Drop for MockSubscription {
    fn drop(&mut self) {
        self.state.lock().unwrap().open_subscriptions -= 1;
    }
}

impl ChangeSubscription for MockSubscription {
    fn wait(&mut self, timeout: Duration) -> WaitOutcome {
        self.pending = None;
        loop {
            let next = {
                let mut state = self.state.lock().unwrap();
                state.wait_calls += 1;
                let next = state.script.pop_front();
                if next.is_none() {
                    if let Some(token) = &state.cancel_when_drained {
                        token.cancel();
                    }
                }
                next
            };

            match next {
                None => {
                    std::thread::sleep(timeout);
                    return WaitOutcome::TimedOut;
                }
                Some(MockWake::Submit(id, details)) => {
                    self.state.lock().unwrap().jobs.insert(id, details);
                }
                Some(MockWake::Purge(id)) => {
                    self.state.lock().unwrap().jobs.remove(&id);
                }
                Some(MockWake::Records(records)) => {
                    self.pending = Some(records);
                    return WaitOutcome::Changed(super::CHANGE_SET_JOB);
                }
                Some(MockWake::NoInfo) => return WaitOutcome::Changed(super::CHANGE_ADD_JOB),
                Some(MockWake::WaitError) => {
                    return WaitOutcome::Failed(SpoolerError::Wait("spurious".to_string()))
                }
                Some(MockWake::HandleLost) => {
                    return WaitOutcome::Failed(SpoolerError::WaitHandle("closed".to_string()))
                }
            }
        }
    }

    fn fetch_change_info(&mut self) -> Option<Vec<ChangeRecord>> {
        self.pending.take()
    }
}
