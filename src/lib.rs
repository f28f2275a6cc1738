//! # Rate-controlled HTTP request loop
//!
//! `curloop` sends the same HTTP request over and over from a pool of worker threads,
//! each holding its own cadence, and prints how many requests completed every second.
//! Without `--loop` it sends one request and exits, which makes it a handy ping too.
//!
//! The interesting parts are `rate.rs` (the drift-free loop) and `pool.rs` (worker
//! lifecycle and shutdown).
//!
//! ## Examples
//!
//! ```no_run
//! # use std::time::Duration;
//! use curloop::{ConfigBuilder, HttpConnector};
//!
//! let config = ConfigBuilder::new("http://127.0.0.1:8000/ping")
//!     .repeat(true)
//!     .workers(4)
//!     .period(Duration::from_millis(250))
//!     .build();
//!
//! let (_interrupt, interrupted) = crossbeam_channel::unbounded();
//! curloop::go(&config, HttpConnector::new(), &interrupted, std::io::stdout())?;
//! # Ok::<(), curloop::Error>(())
//! ```
//!
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod pool;
pub mod rate;
pub mod reporter;
pub mod request;
pub mod server;
pub mod signal;
pub mod stats;

pub use client::{Connector, HttpConnector, Response, Session};
pub use config::{Config, ConfigBuilder, FileConfig};
pub use error::{Error, Result};
pub use executor::{Executor, Outcome};
pub use pool::{Summary, WorkerPool};
pub use rate::{Mode, RateLoop};
pub use reporter::Reporter;
pub use request::{Method, Request};
pub use signal::{stop_signal, StopHandle, StopSignal};
pub use stats::{Counter, Stats};

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use log::{info, LevelFilter};

pub fn setup_logger(log_level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log_level)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;

    Ok(())
}

/// Runs `config` to completion.
///
/// In single-shot mode one request is made on the calling thread and nothing is
/// reported. Otherwise the worker pool runs while the calling thread writes a
/// throughput line to `out` every second, until `interrupt` receives a message or
/// disconnects; then the workers are stopped and joined before returning.
pub fn go<C, W>(config: &Config, connector: C, interrupt: &Receiver<()>, out: W) -> Result<Summary>
where
    C: Connector + 'static,
    W: Write,
{
    let request = config.request()?;
    let counter = Arc::new(Counter::new());
    let executor = Executor::new(connector, Arc::clone(&counter)).with_timeout(config.timeout);

    if !config.repeat {
        let (_stop, signal) = stop_signal();
        let stats = config
            .rate_loop()
            .run(&signal, || executor.execute(&request));
        return Ok(Summary {
            workers: 1,
            stats,
            crashed: 0,
        });
    }

    info!(
        "{} {} with {} worker(s) every {:?}",
        request.method(),
        request.url(),
        config.num_workers(),
        config.period
    );

    let mut pool = WorkerPool::new(config.num_workers(), request, executor, config.rate_loop())
        .stagger(config.stagger);
    pool.start()?;

    let reported = Reporter::new(counter, out).run(interrupt);

    pool.request_stop();
    let summary = pool.await_all_stopped();
    info!("all workers stopped: {:?}", summary);

    reported?;
    Ok(summary)
}
