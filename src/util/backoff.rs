//! Exponential backoff for idle worker loops.

use std::hint::spin_loop;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Exponential backoff: spin, then yield, then sleep.
#[derive(Debug)]
pub struct Backoff {
    step: AtomicUsize,
}

impl Backoff {
    const SPIN_LIMIT: usize = 6;
    const YIELD_LIMIT: usize = 10;

    /// Create a new backoff instance
    pub fn new() -> Self {
        Self {
            step: AtomicUsize::new(0),
        }
    }

    /// Reset the backoff to its initial state
    pub fn reset(&self) {
        self.step.store(0, Ordering::Relaxed);
    }

    /// Perform one step of backoff
    pub fn spin(&self) {
        let step = self.step.fetch_add(1, Ordering::Relaxed);

        if step <= Self::SPIN_LIMIT {
            for _ in 0..(1 << step.min(Self::SPIN_LIMIT)) {
                spin_loop();
            }
        } else if step <= Self::YIELD_LIMIT {
            thread::yield_now();
        } else {
            thread::sleep(Duration::from_micros(1));
        }
    }

    /// Whether the backoff has progressed past spinning and yielding
    pub fn is_completed(&self) -> bool {
        self.step.load(Ordering::Relaxed) > Self::YIELD_LIMIT
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let backoff = Backoff::new();

        assert!(!backoff.is_completed());

        for _ in 0..20 {
            backoff.spin();
        }

        assert!(backoff.is_completed());
    }

    #[test]
    fn test_backoff_reset() {
        let backoff = Backoff::new();

        for _ in 0..20 {
            backoff.spin();
        }
        assert!(backoff.is_completed());

        backoff.reset();
        assert!(!backoff.is_completed());
    }
}
