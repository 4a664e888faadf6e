use super::job::Job;
use super::panic_handler::PanicHandler;
use super::worker::{Worker, WorkerId};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::scheduler::{Priority, PriorityQueue};
use crossbeam_deque::{Injector, Stealer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[cfg(feature = "telemetry")]
use crate::telemetry::Metrics;

#[cfg(target_os = "linux")]
fn pin_thread_to_core(core_id: usize) {
    unsafe {
        let mut cpuset: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core_id, &mut cpuset);
        let result = libc::sched_setaffinity(
            0, // current thread
            std::mem::size_of::<libc::cpu_set_t>(),
            &cpuset,
        );
        if result != 0 {
            eprintln!(
                "Failed to pin thread {} to core {}",
                std::thread::current().name().unwrap_or("unknown"),
                core_id
            );
        }
    }
}

/// Fixed-size pool of worker threads that drains submitted jobs.
///
/// Queues are unbounded: a submit never blocks and never rejects. `Default`
/// jobs land in the global injector and flow through the work-stealing
/// deques; the other tiers go through the shared priority heap, which
/// workers check before the injector.
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    injector: Arc<Injector<Job>>,
    priority_queue: Arc<PriorityQueue>,
    stealers: Vec<Stealer<Job>>,
    shutdown: Arc<AtomicBool>,
    num_threads: usize,
    pending_jobs: Arc<AtomicUsize>,
    panic_handler: Arc<PanicHandler>,
    #[cfg(feature = "telemetry")]
    pub(crate) metrics: Arc<Metrics>,
    #[cfg(feature = "telemetry")]
    telemetry_enabled: bool,
}

struct WorkerHandle {
    id: WorkerId,
    thread: Option<JoinHandle<()>>,
    unparker: thread::Thread,
}

impl WorkerPool {
    pub fn new(config: &Config) -> Result<Self> {
        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let injector = Arc::new(Injector::new());
        let priority_queue = Arc::new(PriorityQueue::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let pending_jobs = Arc::new(AtomicUsize::new(0));
        let panic_handler = Arc::new(PanicHandler::new(config.panic_strategy));

        #[cfg(feature = "telemetry")]
        let metrics = Arc::new(Metrics::new());

        let mut workers = Vec::with_capacity(num_threads);
        let mut stealers = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let worker = Worker::new(id, panic_handler.clone());
            stealers.push(worker.local_queue.stealer());
            workers.push(worker);
        }

        let mut handles = Vec::with_capacity(num_threads);

        for worker in workers {
            let id = worker.id;
            let stealers_clone = stealers.clone();
            let injector_clone = injector.clone();
            let priority_queue_clone = priority_queue.clone();
            let shutdown_clone = shutdown.clone();
            let pending_clone = pending_jobs.clone();
            let name = format!("{}-{}", config.thread_name_prefix, id);

            #[cfg(feature = "telemetry")]
            let worker = if config.enable_telemetry {
                worker.with_metrics(metrics.clone())
            } else {
                worker
            };

            let mut builder = thread::Builder::new().name(name);

            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let pin_workers = config.pin_workers;
            let thread = builder
                .spawn(move || {
                    #[cfg(target_os = "linux")]
                    if pin_workers {
                        pin_thread_to_core(id);
                    }
                    #[cfg(not(target_os = "linux"))]
                    let _ = pin_workers;

                    worker.run(
                        stealers_clone,
                        injector_clone,
                        priority_queue_clone,
                        shutdown_clone,
                        pending_clone,
                    );
                })
                .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;

            let unparker = thread.thread().clone();

            handles.push(WorkerHandle {
                id,
                thread: Some(thread),
                unparker,
            });
        }

        Ok(Self {
            workers: handles,
            injector,
            priority_queue,
            stealers,
            shutdown,
            num_threads,
            pending_jobs,
            panic_handler,
            #[cfg(feature = "telemetry")]
            metrics,
            #[cfg(feature = "telemetry")]
            telemetry_enabled: config.enable_telemetry,
        })
    }

    pub(crate) fn submit(&self, job: Job) {
        let priority = job.priority;
        self.submit_with_priority(job, priority);
    }

    pub(crate) fn submit_with_priority(&self, job: Job, priority: Priority) {
        self.pending_jobs.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "telemetry")]
        if self.telemetry_enabled {
            self.metrics.record_spawn();
        }

        if priority.uses_injector() {
            // Default tier goes to the injector for work stealing
            self.injector.push(job);
        } else {
            // High/Low/Background go through the priority heap
            self.priority_queue.push(job, priority);
        }

        // Wake the workers so a parked pool picks the job up promptly
        for worker in &self.workers {
            worker.unparker.unpark();
        }
    }

    /// Metrics handle for tasks to record wait-side events, when enabled.
    #[cfg(feature = "telemetry")]
    pub(crate) fn task_metrics(&self) -> Option<Arc<Metrics>> {
        self.telemetry_enabled.then(|| self.metrics.clone())
    }

    pub fn pending_jobs(&self) -> usize {
        self.pending_jobs.load(Ordering::Relaxed)
    }

    pub fn panic_count(&self) -> usize {
        self.panic_handler.panic_count()
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);

        // wake everyone up to check the shutdown flag
        for worker in &self.workers {
            worker.unparker.unpark();
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads)
            .field("pending_jobs", &self.pending_jobs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;

    fn small_pool() -> WorkerPool {
        let config = Config::builder().num_threads(2).build().unwrap();
        WorkerPool::new(&config).unwrap()
    }

    #[test]
    fn test_pool_runs_submitted_jobs() {
        let pool = small_pool();
        let counter = Arc::new(AtomicU64::new(0));

        for _ in 0..16 {
            let counter = counter.clone();
            pool.submit(Job::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) < 16 {
            assert!(std::time::Instant::now() < deadline, "jobs did not drain");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_all_tiers_execute() {
        let pool = small_pool();
        let counter = Arc::new(AtomicU64::new(0));

        for priority in [
            Priority::High,
            Priority::Default,
            Priority::Low,
            Priority::Background,
        ] {
            let counter = counter.clone();
            pool.submit(Job::with_priority(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
                priority,
            ));
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) < 4 {
            assert!(std::time::Instant::now() < deadline, "jobs did not drain");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_panicking_job_does_not_kill_pool() {
        let config = Config::builder()
            .num_threads(1)
            .panic_strategy(crate::executor::PanicStrategy::Isolate)
            .build()
            .unwrap();
        let pool = WorkerPool::new(&config).unwrap();

        pool.submit(Job::new(|| panic!("boom")));

        let counter = Arc::new(AtomicU64::new(0));
        let c = counter.clone();
        pool.submit(Job::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) < 1 {
            assert!(std::time::Instant::now() < deadline, "pool died after panic");
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(pool.panic_count(), 1);
    }
}
