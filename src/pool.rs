//! Owns the worker threads and their shutdown.
//!
//! A pool moves through `Created -> Running -> StopRequested -> Stopped` and never
//! leaves `Stopped`. Every thread it spawns is joined before it reaches `Stopped`,
//! including when the pool is dropped while still running.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info};

use crate::client::Connector;
use crate::executor::Executor;
use crate::rate::{Mode, RateLoop};
use crate::signal::{stop_signal, StopHandle, StopSignal};
use crate::stats::Stats;
use crate::{Error, Request, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Created,
    Running,
    StopRequested,
    Stopped,
}

/// Totals across all workers once the pool has stopped.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub workers: usize,
    pub stats: Stats,
    /// Workers whose thread died instead of returning.
    pub crashed: usize,
}

pub struct WorkerPool<C> {
    num_workers: usize,
    rate: RateLoop,
    stagger: bool,
    request: Arc<Request>,
    executor: Arc<Executor<C>>,
    state: State,
    stop: Option<StopHandle>,
    signal: StopSignal,
    working: Vec<JoinHandle<Stats>>,
}

impl<C> WorkerPool<C>
where
    C: Connector + 'static,
{
    pub fn new(
        num_workers: usize,
        request: Request,
        executor: Executor<C>,
        rate: RateLoop,
    ) -> WorkerPool<C> {
        let (stop, signal) = stop_signal();
        WorkerPool {
            num_workers,
            rate,
            stagger: false,
            request: Arc::new(request),
            executor: Arc::new(executor),
            state: State::Created,
            stop: Some(stop),
            signal,
            working: Vec::with_capacity(num_workers),
        }
    }

    /// Spread worker start times evenly across one period.
    pub fn stagger(mut self, stagger: bool) -> WorkerPool<C> {
        self.stagger = stagger;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Number of workers requested
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Number of workers whose loop hasn't returned yet
    pub fn cur_workers(&self) -> usize {
        self.working.iter().filter(|h| !h.is_finished()).count()
    }

    /// Launches every worker. Does nothing unless the pool is freshly created.
    ///
    /// If a thread fails to spawn, the workers already running are stopped and joined
    /// before the error is returned.
    pub fn start(&mut self) -> Result<()> {
        if self.state != State::Created {
            debug!("pool already started ({:?})", self.state);
            return Ok(());
        }

        self.state = State::Running;
        info!(
            "starting {} worker(s), period {:?}",
            self.num_workers,
            self.rate.period()
        );

        for id in 0..self.num_workers {
            match self.spawn_worker(id) {
                Ok(handle) => self.working.push(handle),
                Err(e) => {
                    error!("failed to start worker {}: {}", id, e);
                    self.request_stop();
                    self.await_all_stopped();
                    return Err(Error::Spawn(e));
                }
            }
        }

        Ok(())
    }

    fn spawn_worker(&self, id: usize) -> std::io::Result<JoinHandle<Stats>> {
        let rate = self.rate;
        let signal = self.signal.clone();
        let request = Arc::clone(&self.request);
        let executor = Arc::clone(&self.executor);
        let offset = if self.stagger && rate.mode() == Mode::Repeat {
            rate.period()
                .checked_div(self.num_workers as u32)
                .and_then(|slot| slot.checked_mul(id as u32))
                .unwrap_or_default()
        } else {
            Default::default()
        };

        thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || {
                debug!("worker {} started", id);
                if signal.wait(offset) {
                    return Stats::default();
                }

                let stats = rate.run(&signal, || executor.execute(&request));
                info!("worker {} stopped: {:?}", id, stats);
                stats
            })
    }

    /// Tells every worker to finish its current attempt and return.
    pub fn request_stop(&mut self) {
        match self.state {
            State::Created => {
                self.stop.take();
                self.state = State::Stopped;
            }
            State::Running => {
                if let Some(stop) = self.stop.take() {
                    stop.stop();
                }
                self.state = State::StopRequested;
            }
            State::StopRequested | State::Stopped => {}
        }
    }

    /// Blocks until every worker has returned and sums what they did.
    ///
    /// Without a prior `request_stop` this only returns once the workers end on their
    /// own, which repeating workers never do.
    pub fn await_all_stopped(&mut self) -> Summary {
        let mut summary = Summary {
            workers: self.working.len(),
            ..Summary::default()
        };

        for (id, handle) in self.working.drain(..).enumerate() {
            match handle.join() {
                Ok(stats) => summary.stats = summary.stats + stats,
                Err(_) => {
                    error!("worker {} crashed", id);
                    summary.crashed += 1;
                }
            }
        }

        self.stop.take();
        self.state = State::Stopped;
        summary
    }
}

impl<C> Drop for WorkerPool<C> {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.stop();
        }
        for handle in self.working.drain(..) {
            handle.join().ok();
        }
    }
}
