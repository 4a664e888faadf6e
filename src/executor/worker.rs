// worker thread loop
use super::job::Job;
use super::panic_handler::PanicHandler;
use crate::scheduler::PriorityQueue;
use crate::util::{Backoff, CachePadded};
use crossbeam_deque::{Injector, Stealer, Worker as WorkerQueue};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[cfg(feature = "telemetry")]
use crate::telemetry::Metrics;

pub type WorkerId = usize;

// per-worker counters
#[derive(Debug)]
pub struct WorkerState {
    pub jobs_executed: AtomicU64,
    pub jobs_stolen: AtomicU64,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            jobs_executed: AtomicU64::new(0),
            jobs_stolen: AtomicU64::new(0),
        }
    }
}

pub(crate) struct Worker {
    pub id: WorkerId,
    pub local_queue: WorkerQueue<Job>,
    pub state: Arc<CachePadded<WorkerState>>,
    pub panic_handler: Arc<PanicHandler>,
    #[cfg(feature = "telemetry")]
    pub metrics: Option<Arc<Metrics>>,
}

impl Worker {
    pub fn new(id: WorkerId, panic_handler: Arc<PanicHandler>) -> Self {
        Self {
            id,
            local_queue: WorkerQueue::new_fifo(),
            state: Arc::new(CachePadded::new(WorkerState::new())),
            panic_handler,
            #[cfg(feature = "telemetry")]
            metrics: None,
        }
    }

    #[cfg(feature = "telemetry")]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    // main loop
    pub fn run(
        &self,
        stealers: Vec<Stealer<Job>>,
        injector: Arc<Injector<Job>>,
        priority_queue: Arc<PriorityQueue>,
        shutdown: Arc<AtomicBool>,
        pending_jobs: Arc<AtomicUsize>,
    ) {
        let backoff = Backoff::new();

        loop {
            if shutdown.load(Ordering::Acquire) {
                break;
            }

            // Order: local -> priority heap -> global injector -> steal
            if let Some(job) = self.find_job(&stealers, &injector, &priority_queue) {
                backoff.reset();
                self.execute_job(job);
                pending_jobs.fetch_sub(1, Ordering::Relaxed);
            } else if backoff.is_completed() {
                // fully backed off, park until a submit unparks us
                thread::park_timeout(Duration::from_micros(100));
            } else {
                backoff.spin();
            }
        }
    }

    fn find_job(
        &self,
        stealers: &[Stealer<Job>],
        injector: &Injector<Job>,
        priority_queue: &PriorityQueue,
    ) -> Option<Job> {
        // 1. Local queue first (best cache locality)
        if let Some(job) = self.local_queue.pop() {
            return Some(job);
        }

        // 2. Tiered jobs from the priority heap
        if let Some(job) = priority_queue.pop() {
            return Some(job);
        }

        // 3. Global injector queue
        loop {
            match injector.steal_batch_and_pop(&self.local_queue) {
                crossbeam_deque::Steal::Success(job) => {
                    self.state.jobs_stolen.fetch_add(1, Ordering::Relaxed);
                    return Some(job);
                }
                crossbeam_deque::Steal::Empty => break,
                crossbeam_deque::Steal::Retry => continue,
            }
        }

        // 4. Steal from other workers
        self.try_steal_from_workers(stealers)
    }

    fn try_steal_from_workers(&self, stealers: &[Stealer<Job>]) -> Option<Job> {
        use rand::seq::SliceRandom;
        use rand::thread_rng;

        if stealers.is_empty() {
            return None;
        }

        let mut indices: Vec<usize> = (0..stealers.len()).collect();
        indices.shuffle(&mut thread_rng());

        for &idx in &indices {
            if idx == self.id {
                continue;
            }

            loop {
                match stealers[idx].steal_batch_and_pop(&self.local_queue) {
                    crossbeam_deque::Steal::Success(job) => {
                        self.state.jobs_stolen.fetch_add(1, Ordering::Relaxed);
                        return Some(job);
                    }
                    crossbeam_deque::Steal::Empty => break,
                    crossbeam_deque::Steal::Retry => continue,
                }
            }
        }

        None
    }

    fn execute_job(&self, job: Job) {
        let spawn_time = job.spawn_time;

        let result = self.panic_handler.execute(|| job.execute());

        match result {
            Ok(()) => {
                #[cfg(feature = "telemetry")]
                if let Some(ref metrics) = self.metrics {
                    metrics.record_completion(spawn_time.elapsed().as_nanos() as u64);
                }
                #[cfg(not(feature = "telemetry"))]
                let _ = spawn_time;
            }
            Err(_info) => {
                // the job never published its result; waiters see a timeout
                #[cfg(feature = "telemetry")]
                if let Some(ref metrics) = self.metrics {
                    metrics.record_panic();
                }
            }
        }

        self.state.jobs_executed.fetch_add(1, Ordering::Relaxed);
    }
}
