use common::JobId;
use std::collections::HashSet;

/// Job ids the monitor has already handled.
///
/// The set only grows for the life of the monitor. Once the spooler reuses an
/// id, the new job is treated as already seen.
#[derive(Debug, Default)]
pub struct ActiveJobs {
    seen: HashSet<JobId>,
}

impl ActiveJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `job_id` and report whether it was unseen. Check and insert are a
    /// single step, so a repeated call for the same id always returns `false`.
    pub fn is_new(&mut self, job_id: JobId) -> bool {
        self.seen.insert(job_id)
    }

    #[cfg(test)]
    pub fn contains(&self, job_id: JobId) -> bool {
        self.seen.contains(&job_id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting_only() {
        let mut jobs = ActiveJobs::new();
        assert!(jobs.is_new(JobId(42)));
        assert!(!jobs.is_new(JobId(42)));
        assert!(jobs.is_new(JobId(43)));
        assert!(!jobs.is_new(JobId(42)));
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn test_contains_does_not_record() {
        let mut jobs = ActiveJobs::new();
        assert!(!jobs.contains(JobId(7)));
        assert!(jobs.is_new(JobId(7)));
        assert!(jobs.contains(JobId(7)));
    }
}
