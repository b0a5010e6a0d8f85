use crate::dedup::ActiveJobs;
use crate::spooler::{Printer, SpoolerError};
use common::{JobDetails, JobId};

/// Details for one job. `None` means the job left the queue before we asked.
pub fn details_for<P: Printer>(printer: &P, job_id: JobId) -> Option<JobDetails> {
    let details = printer.job_details(job_id);
    if details.is_none() {
        log::debug!("Job {} vanished before its details could be read", job_id);
    }
    details
}

/// Enumerate the queue and return the jobs not yet in `active`, marking each
/// returned job as seen.
pub fn enumerate_new<P: Printer>(
    printer: &P,
    active: &mut ActiveJobs,
    max_jobs: u32,
) -> Result<Vec<(JobId, JobDetails)>, SpoolerError> {
    let jobs = printer.enumerate_jobs(max_jobs)?;
    log::debug!("Enumeration returned {} job(s)", jobs.len());
    Ok(jobs
        .into_iter()
        .filter(|(id, _)| active.is_new(*id))
        .collect())
}
