use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the pool does when a submitted closure panics.
///
/// There is no error channel back to the waiting side; a panicked job never
/// publishes its result, so waiters with a timeout observe `None`. The
/// strategy only controls what happens to the worker and the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanicStrategy {
    /// Abort the whole process on the first panicked job.
    Abort,
    /// Swallow the panic silently; the worker keeps running.
    Isolate,
    /// Log the panic to stderr and keep the worker running.
    LogAndContinue,
}

impl Default for PanicStrategy {
    fn default() -> Self {
        PanicStrategy::LogAndContinue
    }
}

/// Best-effort description of a caught panic payload.
#[derive(Debug, Clone)]
pub struct PanicInfo {
    pub message: String,
}

impl PanicInfo {
    fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self { message }
    }
}

pub struct PanicHandler {
    strategy: PanicStrategy,
    panic_count: AtomicUsize,
}

impl PanicHandler {
    pub fn new(strategy: PanicStrategy) -> Self {
        Self {
            strategy,
            panic_count: AtomicUsize::new(0),
        }
    }

    /// Run `f`, containing any unwind according to the configured strategy.
    pub fn execute<F, R>(&self, f: F) -> Result<R, PanicInfo>
    where
        F: FnOnce() -> R,
    {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => Ok(result),
            Err(payload) => {
                self.panic_count.fetch_add(1, Ordering::Relaxed);

                let info = PanicInfo::from_payload(payload);

                match self.strategy {
                    PanicStrategy::Abort => {
                        eprintln!("waitpool: job panicked (abort strategy): {}", info.message);
                        std::process::abort();
                    }
                    PanicStrategy::Isolate => {}
                    PanicStrategy::LogAndContinue => {
                        eprintln!("waitpool: job panicked: {}", info.message);
                    }
                }

                Err(info)
            }
        }
    }

    pub fn panic_count(&self) -> usize {
        self.panic_count.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for PanicHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanicHandler")
            .field("strategy", &self.strategy)
            .field("panic_count", &self.panic_count.load(Ordering::Relaxed))
            .finish()
    }
}
