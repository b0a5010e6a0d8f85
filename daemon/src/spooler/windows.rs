//! winspool backend.

use super::{ChangeRecord, ChangeSubscription, JobField, Printer, Spooler, SpoolerError, WaitOutcome};
use common::{JobDetails, JobId};
use std::ptr;
use std::time::Duration;
use windows_sys::Win32::Foundation::{GetLastError, INVALID_HANDLE_VALUE, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows_sys::Win32::Graphics::Printing::{
    ClosePrinter, EnumJobsW, FindClosePrinterChangeNotification, FindFirstPrinterChangeNotification,
    FindNextPrinterChangeNotification, FreePrinterNotifyInfo, GetJobW, OpenPrinterW, JOB_INFO_2W,
    JOB_NOTIFY_FIELD_DOCUMENT, JOB_NOTIFY_FIELD_STATUS, JOB_NOTIFY_TYPE, PRINTER_NOTIFY_INFO,
    PRINTER_NOTIFY_OPTIONS, PRINTER_NOTIFY_OPTIONS_TYPE,
};
use windows_sys::Win32::System::Threading::WaitForSingleObject;

const NOTIFY_OPTIONS_VERSION: u32 = 2;
const NOTIFY_INFO_DISCARDED: u32 = 0x01;

pub struct WinSpooler;

impl Spooler for WinSpooler {
    type Printer = WinPrinter;

    fn open(&self, printer_name: &str) -> Result<WinPrinter, SpoolerError> {
        let wide = to_wide(printer_name);
        let mut handle = 0;
        let ok = unsafe { OpenPrinterW(wide.as_ptr(), &mut handle, ptr::null()) };
        if ok == 0 {
            return Err(SpoolerError::PrinterOpen {
                printer: printer_name.to_string(),
                reason: last_error(),
            });
        }
        Ok(WinPrinter { handle })
    }
}

pub struct WinPrinter {
    handle: isize,
}

impl Drop for WinPrinter {
    fn drop(&mut self) {
        unsafe {
            ClosePrinter(self.handle);
        }
        log::debug!("Printer handle closed");
    }
}

impl Printer for WinPrinter {
    type Subscription = WinSubscription;

    fn subscribe(&self, change_mask: u32, fields: &[JobField]) -> Result<WinSubscription, SpoolerError> {
        let mut field_codes: Vec<u16> = fields.iter().map(|f| field_code(*f)).collect();
        let mut options_type = PRINTER_NOTIFY_OPTIONS_TYPE {
            Type: JOB_NOTIFY_TYPE as u16,
            Reserved0: 0,
            Reserved1: 0,
            Reserved2: 0,
            Count: field_codes.len() as u32,
            pFields: field_codes.as_mut_ptr(),
        };
        let options = PRINTER_NOTIFY_OPTIONS {
            Version: NOTIFY_OPTIONS_VERSION,
            Flags: 0,
            Count: 1,
            pTypes: &mut options_type,
        };

        let change = unsafe {
            FindFirstPrinterChangeNotification(
                self.handle,
                change_mask,
                0,
                &options as *const PRINTER_NOTIFY_OPTIONS as *const _,
            )
        };
        if change == INVALID_HANDLE_VALUE {
            return Err(SpoolerError::Register(last_error()));
        }
        Ok(WinSubscription { change, pending: ptr::null_mut() })
    }

    fn job_details(&self, job_id: JobId) -> Option<JobDetails> {
        let mut needed = 0u32;
        unsafe {
            GetJobW(self.handle, job_id.0, 2, ptr::null_mut(), 0, &mut needed);
        }
        if needed == 0 {
            return None;
        }

        let mut buffer = aligned_buffer(needed);
        let ok = unsafe {
            GetJobW(self.handle, job_id.0, 2, buffer.as_mut_ptr() as *mut u8, needed, &mut needed)
        };
        if ok == 0 {
            return None;
        }
        let info = unsafe { &*(buffer.as_ptr() as *const JOB_INFO_2W) };
        Some(unsafe { details_from(info) })
    }

    fn enumerate_jobs(&self, max_jobs: u32) -> Result<Vec<(JobId, JobDetails)>, SpoolerError> {
        let mut needed = 0u32;
        let mut returned = 0u32;
        unsafe {
            EnumJobsW(self.handle, 0, max_jobs, 2, ptr::null_mut(), 0, &mut needed, &mut returned);
        }
        if needed == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = aligned_buffer(needed);
        let ok = unsafe {
            EnumJobsW(
                self.handle,
                0,
                max_jobs,
                2,
                buffer.as_mut_ptr() as *mut u8,
                needed,
                &mut needed,
                &mut returned,
            )
        };
        if ok == 0 {
            return Err(SpoolerError::Enumerate(last_error()));
        }

        let jobs = unsafe { std::slice::from_raw_parts(buffer.as_ptr() as *const JOB_INFO_2W, returned as usize) };
        Ok(jobs
            .iter()
            .map(|job| (JobId(job.JobId), unsafe { details_from(job) }))
            .collect())
    }
}

pub struct WinSubscription {
    change: isize,
    pending: *mut PRINTER_NOTIFY_INFO,
}

// The subscription only ever lives on the monitor thread; it is moved there once.
unsafe impl Send for WinSubscription {}

impl WinSubscription {
    fn release_pending(&mut self) {
        if !self.pending.is_null() {
            unsafe {
                FreePrinterNotifyInfo(self.pending);
            }
            self.pending = ptr::null_mut();
        }
    }
}

impl Drop for WinSubscription {
    fn drop(&mut self) {
        self.release_pending();
        unsafe {
            FindClosePrinterChangeNotification(self.change);
        }
        log::debug!("Printer change notification closed");
    }
}

impl ChangeSubscription for WinSubscription {
    fn wait(&mut self, timeout: Duration) -> WaitOutcome {
        self.release_pending();

        let millis = timeout.as_millis().min(u32::MAX as u128) as u32;
        let status = unsafe { WaitForSingleObject(self.change, millis) };
        if status == WAIT_TIMEOUT {
            return WaitOutcome::TimedOut;
        }
        if status != WAIT_OBJECT_0 {
            return WaitOutcome::Failed(SpoolerError::WaitHandle(last_error()));
        }

        let mut change = 0u32;
        let mut info: *mut core::ffi::c_void = ptr::null_mut();
        let ok = unsafe { FindNextPrinterChangeNotification(self.change, &mut change, ptr::null(), &mut info) };
        if ok == 0 {
            return WaitOutcome::Failed(SpoolerError::Wait(last_error()));
        }
        self.pending = info as *mut PRINTER_NOTIFY_INFO;
        WaitOutcome::Changed(change)
    }

    fn fetch_change_info(&mut self) -> Option<Vec<ChangeRecord>> {
        if self.pending.is_null() {
            return None;
        }

        let records = unsafe {
            let info = &*self.pending;
            if info.Flags & NOTIFY_INFO_DISCARDED != 0 {
                log::debug!("Spooler discarded notification data");
                None
            } else {
                let data = std::slice::from_raw_parts(info.aData.as_ptr(), info.Count as usize);
                let records: Vec<ChangeRecord> = data
                    .iter()
                    .filter(|d| d.Type as u32 == JOB_NOTIFY_TYPE as u32)
                    .map(|d| ChangeRecord {
                        job_id: JobId(d.Id),
                        field: field_from_code(d.Field),
                    })
                    .collect();
                if records.is_empty() {
                    None
                } else {
                    Some(records)
                }
            }
        };
        self.release_pending();
        records
    }
}

fn field_code(field: JobField) -> u16 {
    match field {
        JobField::Status => JOB_NOTIFY_FIELD_STATUS as u16,
        JobField::Document => JOB_NOTIFY_FIELD_DOCUMENT as u16,
        JobField::Other(code) => code,
    }
}

fn field_from_code(code: u16) -> JobField {
    if code == JOB_NOTIFY_FIELD_STATUS as u16 {
        JobField::Status
    } else if code == JOB_NOTIFY_FIELD_DOCUMENT as u16 {
        JobField::Document
    } else {
        JobField::Other(code)
    }
}

/// `u64`-backed scratch space so the spooler's structs land correctly aligned.
fn aligned_buffer(bytes: u32) -> Vec<u64> {
    vec![0u64; (bytes as usize + 7) / 8]
}

unsafe fn details_from(info: &JOB_INFO_2W) -> JobDetails {
    JobDetails {
        document_name: from_wide(info.pDocument),
        printer_name: from_wide(info.pPrinterName),
        page_count: info.TotalPages,
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

unsafe fn from_wide(p: *const u16) -> String {
    if p.is_null() {
        return String::new();
    }
    let mut len = 0;
    while *p.add(len) != 0 {
        len += 1;
    }
    String::from_utf16_lossy(std::slice::from_raw_parts(p, len))
}

fn last_error() -> String {
    format!("win32 error {}", unsafe { GetLastError() })
}
