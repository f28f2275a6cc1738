use std::sync::Arc;
use std::time::Duration;

use log::{trace, warn};

use crate::client::{Connector, Session};
use crate::stats::Counter;
use crate::{Request, Result};

/// Per-request timeout unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How a completed attempt was classified.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(u16),
    Failure(u16),
}

impl Outcome {
    fn from_status(status: u16) -> Outcome {
        match status {
            200 | 201 => Outcome::Success(status),
            _ => Outcome::Failure(status),
        }
    }
}

/// Performs single attempts and counts the ones that complete.
#[derive(Debug)]
pub struct Executor<C> {
    connector: C,
    counter: Arc<Counter>,
    timeout: Duration,
}

impl<C: Connector> Executor<C> {
    pub fn new(connector: C, counter: Arc<Counter>) -> Executor<C> {
        Executor {
            connector,
            counter,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Executor<C> {
        self.timeout = timeout;
        self
    }

    /// Sends `request` once over a fresh session.
    ///
    /// Any response counts as completed, including non-success statuses, whose body is
    /// logged. Transport errors return `Err` and are not counted.
    pub fn execute(&self, request: &Request) -> Result<Outcome> {
        let response = {
            let mut session = self.connector.open()?;
            session.send(request, self.timeout)?
        };

        self.counter.increment();

        let outcome = Outcome::from_status(response.status);
        match outcome {
            Outcome::Success(status) => {
                trace!("{} {} -> {}", request.method(), request.url(), status)
            }
            Outcome::Failure(status) => warn!(
                "{} {} -> {}: {}",
                request.method(),
                request.url(),
                status,
                response.body
            ),
        }

        Ok(outcome)
    }
}
