//! Priority scheduling subsystem.
//!
//! The scheduler decides which queue a submitted job lands in: `Default`
//! jobs go to the work-stealing injector, every other tier goes through a
//! shared priority heap that workers drain ahead of the injector.

pub mod priority;

pub use priority::Priority;

pub(crate) use priority::PriorityQueue;
