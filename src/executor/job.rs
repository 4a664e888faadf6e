//! Internal unit of work handed to the pool.

use crate::scheduler::Priority;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global job ID counter
static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a submitted job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl JobId {
    fn next() -> Self {
        JobId(JOB_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// One closure invocation queued on the pool. A job is created by `spawn`,
/// runs exactly once on a worker thread, and is never resubmitted.
pub(crate) struct Job {
    pub(crate) id: JobId,
    pub(crate) run: Box<dyn FnOnce() + Send + 'static>,
    pub(crate) priority: Priority,
    pub(crate) spawn_time: Instant,
}

impl Job {
    /// Create a job at the default tier
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::with_priority(f, Priority::Default)
    }

    /// Create a job at a specific tier
    pub fn with_priority<F>(f: F, priority: Priority) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Job {
            id: JobId::next(),
            run: Box::new(f),
            priority,
            spawn_time: Instant::now(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Execute the job, consuming it
    pub fn execute(self) {
        (self.run)();
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("spawn_time", &self.spawn_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique() {
        let a = Job::new(|| {});
        let b = Job::new(|| {});
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_execute_runs_closure() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let job = Job::with_priority(move || flag.store(true, Ordering::SeqCst), Priority::High);

        assert_eq!(job.priority, Priority::High);
        job.execute();
        assert!(ran.load(Ordering::SeqCst));
    }
}
