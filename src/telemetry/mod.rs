//! Telemetry and observability subsystem.
//!
//! Collects counters for spawned, completed, panicked and timed-out work
//! plus a spawn-to-publish latency histogram, and can export snapshots as
//! JSON.

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub mod export;

#[cfg(feature = "telemetry")]
pub use export::{JsonExporter, MetricsExporter};

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

// Stub implementations when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    #[derive(Debug, Clone)]
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Self {
            Self
        }
        pub fn record_spawn(&self) {}
        pub fn record_completion(&self, _: u64) {}
        pub fn record_panic(&self) {}
        pub fn record_wait_timeout(&self) {}
        pub fn snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot::default()
        }
        pub fn reset(&self) {}
    }

    #[derive(Debug, Clone, Default)]
    pub struct MetricsSnapshot {
        pub jobs_spawned: u64,
        pub jobs_completed: u64,
        pub jobs_panicked: u64,
        pub waits_timed_out: u64,
        pub avg_latency_ns: u64,
        pub p50_latency_ns: u64,
        pub p99_latency_ns: u64,
    }
}

#[cfg(not(feature = "telemetry"))]
pub use metrics::{Metrics, MetricsSnapshot};
