//! Metrics collection for pool and wait activity.

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Runtime metrics collector
#[derive(Debug)]
pub struct Metrics {
    // Job counters
    jobs_spawned: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_panicked: AtomicU64,

    // Wait-side counters
    waits_timed_out: AtomicU64,

    // Spawn-to-publish latency histogram (RwLock for interior mutability)
    latency_histogram: RwLock<Histogram<u64>>,

    // Creation time
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        // 3 significant figures, max value of 1 hour in nanoseconds
        let histogram = Histogram::new_with_max(3_600_000_000_000, 3)
            .expect("Failed to create histogram");

        Self {
            jobs_spawned: AtomicU64::new(0),
            jobs_completed: AtomicU64::new(0),
            jobs_panicked: AtomicU64::new(0),
            waits_timed_out: AtomicU64::new(0),
            latency_histogram: RwLock::new(histogram),
            start_time: Instant::now(),
        }
    }

    /// Record a job submission
    pub fn record_spawn(&self) {
        self.jobs_spawned.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed job with its spawn-to-publish latency
    pub fn record_completion(&self, latency_ns: u64) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);

        if let Some(mut hist) = self.latency_histogram.try_write() {
            let _ = hist.record(latency_ns);
        }
    }

    /// Record a panicked job
    pub fn record_panic(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a timed wait that expired before the job published
    pub fn record_wait_timeout(&self) {
        self.waits_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let histogram = self.latency_histogram.read();

        MetricsSnapshot {
            timestamp: Instant::now(),
            uptime: self.start_time.elapsed(),
            jobs_spawned: self.jobs_spawned.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_panicked: self.jobs_panicked.load(Ordering::Relaxed),
            waits_timed_out: self.waits_timed_out.load(Ordering::Relaxed),
            avg_latency_ns: if histogram.len() > 0 {
                histogram.mean() as u64
            } else {
                0
            },
            p50_latency_ns: histogram.value_at_quantile(0.50),
            p95_latency_ns: histogram.value_at_quantile(0.95),
            p99_latency_ns: histogram.value_at_quantile(0.99),
            max_latency_ns: histogram.max(),
        }
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.jobs_spawned.store(0, Ordering::Relaxed);
        self.jobs_completed.store(0, Ordering::Relaxed);
        self.jobs_panicked.store(0, Ordering::Relaxed);
        self.waits_timed_out.store(0, Ordering::Relaxed);

        if let Some(mut hist) = self.latency_histogram.try_write() {
            hist.reset();
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the collector.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub timestamp: Instant,
    pub uptime: Duration,
    pub jobs_spawned: u64,
    pub jobs_completed: u64,
    pub jobs_panicked: u64,
    pub waits_timed_out: u64,
    pub avg_latency_ns: u64,
    pub p50_latency_ns: u64,
    pub p95_latency_ns: u64,
    pub p99_latency_ns: u64,
    pub max_latency_ns: u64,
}

impl MetricsSnapshot {
    /// Jobs still queued or running at snapshot time
    pub fn jobs_in_flight(&self) -> u64 {
        self.jobs_spawned
            .saturating_sub(self.jobs_completed + self.jobs_panicked)
    }

    /// Completed jobs per second of uptime
    pub fn jobs_per_second(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.jobs_completed as f64 / secs
        }
    }
}
