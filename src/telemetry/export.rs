//! Metrics export functionality.

use super::metrics::MetricsSnapshot;
use crate::error::Result;

/// Trait for exporting metrics to different formats
pub trait MetricsExporter: Send + Sync {
    /// Export a metrics snapshot
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()>;
}

/// Export metrics to a JSON file
#[derive(Debug)]
pub struct JsonExporter {
    output_path: std::path::PathBuf,
}

impl JsonExporter {
    /// Create a new JSON exporter
    pub fn new(output_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }
}

impl MetricsExporter for JsonExporter {
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        let serializable = SerializableSnapshot::from(snapshot);
        let json = serde_json::to_string_pretty(&serializable).map_err(|e| {
            crate::error::Error::telemetry(format!("JSON serialization failed: {}", e))
        })?;

        std::fs::write(&self.output_path, json)
            .map_err(|e| crate::error::Error::telemetry(format!("Failed to write file: {}", e)))?;

        Ok(())
    }
}

/// Serializable view of a MetricsSnapshot
#[derive(Debug, Clone, serde::Serialize)]
struct SerializableSnapshot {
    uptime_secs: f64,
    jobs_spawned: u64,
    jobs_completed: u64,
    jobs_panicked: u64,
    jobs_in_flight: u64,
    waits_timed_out: u64,
    avg_latency_us: f64,
    p50_latency_us: f64,
    p95_latency_us: f64,
    p99_latency_us: f64,
    max_latency_us: f64,
    jobs_per_second: f64,
}

impl From<&MetricsSnapshot> for SerializableSnapshot {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        Self {
            uptime_secs: snapshot.uptime.as_secs_f64(),
            jobs_spawned: snapshot.jobs_spawned,
            jobs_completed: snapshot.jobs_completed,
            jobs_panicked: snapshot.jobs_panicked,
            jobs_in_flight: snapshot.jobs_in_flight(),
            waits_timed_out: snapshot.waits_timed_out,
            avg_latency_us: snapshot.avg_latency_ns as f64 / 1_000.0,
            p50_latency_us: snapshot.p50_latency_ns as f64 / 1_000.0,
            p95_latency_us: snapshot.p95_latency_ns as f64 / 1_000.0,
            p99_latency_us: snapshot.p99_latency_ns as f64 / 1_000.0,
            max_latency_us: snapshot.max_latency_ns as f64 / 1_000.0,
            jobs_per_second: snapshot.jobs_per_second(),
        }
    }
}
