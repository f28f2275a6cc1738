use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info};

use crate::stats::Counter;
use crate::Result;

pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Prints the completed-request count once per interval on the calling thread.
#[derive(Debug)]
pub struct Reporter<W> {
    counter: Arc<Counter>,
    out: W,
    interval: Duration,
}

impl<W: Write> Reporter<W> {
    pub fn new(counter: Arc<Counter>, out: W) -> Reporter<W> {
        Reporter {
            counter,
            out,
            interval: REPORT_INTERVAL,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Reporter<W> {
        self.interval = interval;
        self
    }

    /// Reports until `interrupt` receives a message or disconnects, returning the
    /// number of lines written. The first line is written immediately and later ones
    /// are spaced from it, not from each other, so the cadence doesn't drift. Reports
    /// missed while a write stalls are skipped, not written in a burst.
    pub fn run(&mut self, interrupt: &Receiver<()>) -> Result<u64> {
        let mut next = Instant::now();
        let mut lines = 0;

        loop {
            let count = self.counter.read_and_reset();
            writeln!(self.out, "{} requests per second", count)?;
            self.out.flush()?;
            lines += 1;

            next += self.interval;
            let now = Instant::now();
            if next <= now {
                debug!("reporter running behind, skipping missed reports");
                next = now + self.interval;
            }
            match interrupt.recv_deadline(next) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!("interrupted after {} report(s)", lines);
        Ok(lines)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
