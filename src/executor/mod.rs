//! Job execution infrastructure.
//!
//! This module provides the worker-pool side of the crate: the internal
//! job representation, worker threads with work stealing, and panic
//! containment for submitted closures.

pub mod job;
pub mod panic_handler;
pub mod pool;
pub mod worker;

pub use panic_handler::{PanicHandler, PanicInfo, PanicStrategy};
pub use pool::WorkerPool;

pub use job::JobId;
pub(crate) use job::Job;
