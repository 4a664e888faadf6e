//! Blocking future handles.
//!
//! [`spawn`] submits a closure to the worker pool and hands back a
//! [`Task`] immediately. The worker publishes the closure's return value
//! into the task's slot and signals completion; [`Task::wait`] and
//! [`Task::wait_timeout`] block the calling thread on that signal.

use crate::executor::{Job, JobId};
use crate::runtime;
use crate::scheduler::Priority;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "telemetry")]
use crate::telemetry::Metrics;

/// Result slot plus completion flag, guarded by the task's own mutex.
///
/// `value` goes from `None` to `Some` exactly once, on the worker thread,
/// before `done` is set. `done` never goes back to `false`.
struct Slot<T> {
    done: bool,
    value: Option<T>,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    completion: Condvar,
}

impl<T> Shared<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                done: false,
                value: None,
            }),
            completion: Condvar::new(),
        }
    }

    /// Publish the result and signal completion. Runs on the worker thread,
    /// once per task; the mutex gives waiters the happens-before edge from
    /// the write to the signal.
    fn publish(&self, value: T) {
        let mut slot = self.slot.lock();
        debug_assert!(!slot.done, "task published twice");
        slot.value = Some(value);
        slot.done = true;
        drop(slot);
        self.completion.notify_all();
    }
}

/// Handle to one in-flight or completed unit of work.
///
/// Created by [`spawn`] or [`spawn_with_priority`]. The handle can be
/// waited on from any thread, shared by reference across threads, and
/// waited on repeatedly: reading the result is idempotent, the slot keeps
/// its value. Dropping the handle does not cancel the work.
pub struct Task<T> {
    shared: Arc<Shared<T>>,
    id: JobId,
    priority: Priority,
    #[cfg(feature = "telemetry")]
    metrics: Option<Arc<Metrics>>,
}

impl<T> Task<T> {
    /// Identifier of the underlying job.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Tier the job was submitted at.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Whether the result has been published. Never blocks.
    pub fn is_finished(&self) -> bool {
        self.shared.slot.lock().done
    }
}

impl<T: Clone> Task<T> {
    /// Block until the result is published, then return it.
    ///
    /// Waits as long as necessary. Repeated calls return clones of the same
    /// value.
    ///
    /// # Panics
    ///
    /// Panics if the completion signal fired but the slot is empty. That
    /// means a broken publication invariant inside the crate, never a
    /// caller error.
    pub fn wait(&self) -> T {
        let mut slot = self.shared.slot.lock();
        while !slot.done {
            self.shared.completion.wait(&mut slot);
        }

        match slot.value.clone() {
            Some(value) => value,
            None => panic!("completed task has an empty result slot"),
        }
    }

    /// Block until the result is published or `timeout` elapses.
    ///
    /// Returns `None` on expiry. Timing out does not cancel the work: the
    /// closure keeps running on the pool, and a later [`Task::wait`] or
    /// `wait_timeout` on the same handle observes the published value.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;

        let mut slot = self.shared.slot.lock();
        while !slot.done {
            if self.shared.completion.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }

        // Read the slot regardless of how the wait ended; the job may have
        // published right at the deadline.
        let value = slot.value.clone();

        #[cfg(feature = "telemetry")]
        if value.is_none() {
            if let Some(ref metrics) = self.metrics {
                metrics.record_wait_timeout();
            }
        }

        value
    }
}

impl<T> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Submit `f` to the pool at the default tier and return its handle.
///
/// Never blocks the caller; the closure runs on a worker thread.
///
/// # Panics
///
/// Panics if the runtime has not been initialized with [`crate::init`].
pub fn spawn<T, F>(f: F) -> Task<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    spawn_with_priority(Priority::Default, f)
}

/// Submit `f` to the queue selected by `priority` and return its handle.
///
/// # Panics
///
/// Panics if the runtime has not been initialized with [`crate::init`].
pub fn spawn_with_priority<T, F>(priority: Priority, f: F) -> Task<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let shared = Arc::new(Shared::new());

    let publisher = Arc::clone(&shared);
    let job = Job::with_priority(move || publisher.publish(f()), priority);
    let id = job.id();

    #[cfg(feature = "telemetry")]
    let metrics = runtime::with_current_runtime(|rt| {
        rt.pool.submit_with_priority(job, priority);
        rt.pool.task_metrics()
    });
    #[cfg(not(feature = "telemetry"))]
    runtime::with_current_runtime(|rt| {
        rt.pool.submit_with_priority(job, priority);
    });

    Task {
        shared,
        id,
        priority,
        #[cfg(feature = "telemetry")]
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{init_thread_local, shutdown};
    use std::thread;

    #[test]
    fn test_wait_returns_closure_value() {
        init_thread_local().unwrap();

        let task = spawn(|| 101 * 4);
        assert_eq!(task.wait(), 404);

        shutdown();
    }

    #[test]
    fn test_wait_is_idempotent() {
        init_thread_local().unwrap();

        let task = spawn(|| String::from("done"));
        assert_eq!(task.wait(), "done");
        assert_eq!(task.wait(), "done");
        assert!(task.is_finished());

        shutdown();
    }

    #[test]
    fn test_timeout_then_rewait() {
        init_thread_local().unwrap();

        let task = spawn(|| {
            thread::sleep(Duration::from_millis(300));
            "late"
        });

        assert_eq!(task.wait_timeout(Duration::from_millis(20)), None);
        assert_eq!(task.wait(), "late");

        shutdown();
    }

    #[test]
    fn test_compound_payload() {
        init_thread_local().unwrap();

        let task = spawn(|| (5, String::from("five")));
        assert_eq!(task.wait(), (5, String::from("five")));

        shutdown();
    }

    #[test]
    fn test_every_priority_tier_runs() {
        init_thread_local().unwrap();

        let tasks: Vec<_> = [
            Priority::High,
            Priority::Default,
            Priority::Low,
            Priority::Background,
        ]
        .into_iter()
        .map(|priority| spawn_with_priority(priority, move || priority))
        .collect();

        for task in &tasks {
            assert_eq!(task.wait(), task.priority());
        }

        shutdown();
    }

    #[test]
    fn test_publish_signals_once() {
        let shared = Arc::new(Shared::new());
        shared.publish(9);

        let slot = shared.slot.lock();
        assert!(slot.done);
        assert_eq!(slot.value, Some(9));
    }
}
