//! WAITPOOL - blocking future handles on a priority-tiered worker pool
//!
//! A minimal future/promise primitive: submit a closure to a background
//! worker pool, get a [`Task`] handle back immediately, and retrieve the
//! result later with an unbounded or deadline-bounded blocking wait.
//!
//! # Quick Start
//!
//! ```no_run
//! use waitpool::prelude::*;
//!
//! // Initialize the runtime
//! waitpool::init().unwrap();
//!
//! // Spawn work and wait for the result
//! let task = spawn(|| 101 * 4);
//! assert_eq!(task.wait(), 404);
//!
//! // A timed wait gives up without cancelling the work
//! let slow = spawn_with_priority(Priority::Background, || {
//!     std::thread::sleep(std::time::Duration::from_secs(3));
//!     "done"
//! });
//! assert_eq!(slow.wait_timeout(std::time::Duration::from_secs(1)), None);
//! assert_eq!(slow.wait(), "done"); // re-waiting observes the result
//!
//! waitpool::shutdown();
//! ```
//!
//! # Features
//!
//! - **Priority Tiers**: `High`, `Default`, `Low` and `Background` queues
//! - **Work Stealing**: default-tier jobs flow through per-worker deques
//! - **Re-waitable Handles**: a timed-out wait never abandons the work
//! - **Idempotent Results**: repeated waits return the same value
//! - **Panic Containment**: a panicking closure never kills the pool
//! - **Telemetry**: counters and latency histogram (optional)

// Lint configuration
#![warn(missing_docs, missing_debug_implementations)]
#![allow(dead_code)] // During development

// Core modules - always available
pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod runtime;
pub mod scheduler;
pub mod task;
pub mod telemetry;
pub mod util;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use runtime::{init, init_with_config, shutdown};
pub use scheduler::Priority;
pub use task::{spawn, spawn_with_priority, Task};
