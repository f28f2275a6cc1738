//! Single-writer stop signal shared by the pool and its workers.
//!
//! The signal is the disconnect of a channel nothing is ever sent on: dropping the
//! only `StopHandle` is the stop, and a disconnected channel can't reconnect, so once
//! stopped the signal stays stopped.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Creates a connected handle/signal pair in the running state.
pub fn stop_signal() -> (StopHandle, StopSignal) {
    let (close, closed) = bounded(0);
    (StopHandle { _close: close }, StopSignal { closed })
}

/// The write side. Consumed by `stop`, so it can be used at most once.
#[derive(Debug)]
pub struct StopHandle {
    _close: Sender<Infallible>,
}

impl StopHandle {
    pub fn stop(self) {}
}

/// The read side, cloned into every worker.
#[derive(Debug, Clone)]
pub struct StopSignal {
    closed: Receiver<Infallible>,
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        match self.closed.try_recv() {
            Ok(never) => match never {},
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => true,
        }
    }

    /// Sleeps until `deadline` or until stopped, whichever comes first. Returns `true`
    /// if woken by the stop.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        match self.closed.recv_deadline(deadline) {
            Ok(never) => match never {},
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Like `wait_until`, but a timeout too long to be represented as an `Instant`
    /// waits for the stop alone.
    pub fn wait(&self, timeout: Duration) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_until(deadline),
            None => self.wait_for_stop(),
        }
    }

    /// Blocks until stopped. Always returns `true`.
    pub fn wait_for_stop(&self) -> bool {
        match self.closed.recv() {
            Ok(never) => match never {},
            Err(_) => true,
        }
    }
}
