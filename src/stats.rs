use std::ops::Add;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of completed requests since the last read, shared by every worker.
///
/// The only operations are `increment` and `read_and_reset`, so increments that race
/// with a reset land either in the value being returned or in the next one, never
/// in neither.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    pub fn new() -> Counter {
        Counter::default()
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read_and_reset(&self) -> u64 {
        self.count.swap(0, Ordering::AcqRel)
    }
}

/// What a single worker did over its lifetime.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Iterations started.
    pub attempts: u64,
    /// Attempts that got a response back, whatever the status.
    pub completed: u64,
    /// Completed attempts with a non-success status.
    pub failures: u64,
    /// Attempts that ended in a transport error.
    pub errors: u64,
    /// Attempts that panicked.
    pub panics: u64,
    /// Iterations that took longer than the period.
    pub overruns: u64,
}

impl Add for Stats {
    type Output = Stats;

    fn add(self, other: Stats) -> Stats {
        Stats {
            attempts: self.attempts + other.attempts,
            completed: self.completed + other.completed,
            failures: self.failures + other.failures,
            errors: self.errors + other.errors,
            panics: self.panics + other.panics,
            overruns: self.overruns + other.overruns,
        }
    }
}
