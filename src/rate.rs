//! The self-correcting request loop each worker runs.
//!
//! Every iteration's deadline is measured from when that iteration *started*, so a
//! steady request latency below the period doesn't accumulate into drift. When an
//! iteration overruns its deadline the next one starts immediately; missed slots are
//! never made up with a burst.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use log::{debug, error};

use crate::executor::Outcome;
use crate::signal::StopSignal;
use crate::stats::Stats;
use crate::Result;

/// Default time between iteration starts.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// One attempt, then return regardless of timing.
    Once,
    /// Keep going until stopped.
    Repeat,
}

#[derive(Debug, Copy, Clone)]
pub struct RateLoop {
    period: Duration,
    mode: Mode,
}

impl RateLoop {
    pub fn new(period: Duration, mode: Mode) -> RateLoop {
        RateLoop { period, mode }
    }

    pub fn once() -> RateLoop {
        RateLoop::new(DEFAULT_PERIOD, Mode::Once)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Calls `attempt` at the configured cadence until `stop` fires.
    ///
    /// The stop is checked before every attempt and wakes the loop out of its sleep,
    /// but an attempt already running is always allowed to finish. Errors and panics
    /// from `attempt` are logged and the loop carries on.
    pub fn run<F>(&self, stop: &StopSignal, mut attempt: F) -> Stats
    where
        F: FnMut() -> Result<Outcome>,
    {
        let mut stats = Stats::default();

        while !stop.is_stopped() {
            let before = Instant::now();
            stats.attempts += 1;

            match catch_unwind(AssertUnwindSafe(&mut attempt)) {
                Ok(Ok(Outcome::Success(_))) => stats.completed += 1,
                Ok(Ok(Outcome::Failure(_))) => {
                    stats.completed += 1;
                    stats.failures += 1;
                }
                Ok(Err(e)) => {
                    error!("request failed: {}", e);
                    stats.errors += 1;
                }
                Err(panic) => {
                    error!("request panicked: {}", panic_message(&*panic));
                    stats.panics += 1;
                }
            }

            let after = Instant::now();

            if self.mode == Mode::Once {
                break;
            }

            let deadline = match before.checked_add(self.period) {
                Some(deadline) => deadline,
                None => {
                    stop.wait_for_stop();
                    break;
                }
            };
            if after >= deadline {
                debug!(
                    "running behind: iteration took {:?}, period is {:?}",
                    after - before,
                    self.period
                );
                stats.overruns += 1;
                continue;
            }

            if stop.wait_until(deadline) {
                break;
            }
        }

        stats
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
