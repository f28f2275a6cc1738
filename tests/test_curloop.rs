//! End-to-end runs against the local canned server.
use std::io::{self, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};

use curloop::server::{http_server, http_server_with_delay, Captured};
use curloop::{go, ConfigBuilder, HttpConnector, Result, Summary};

/// Forwards every complete line written to it.
struct Lines {
    lines: Sender<String>,
    partial: Vec<u8>,
}

impl Write for Lines {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.partial.extend_from_slice(buf);
        while let Some(end) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line).trim_end().to_string();
            self.lines.send(line).ok();
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs a looping config until `reports` throughput lines were printed, then
/// interrupts it. Returns the printed counts and the final summary.
fn run_for_reports(config: curloop::Config, reports: usize) -> (Vec<u64>, Summary) {
    let (lines, printed) = unbounded();
    let (interrupt, interrupted) = unbounded();

    let runner = thread::spawn(move || {
        let sink = Lines {
            lines,
            partial: vec![],
        };
        go(&config, HttpConnector::new(), &interrupted, sink)
    });

    let mut counts = vec![];
    while counts.len() < reports {
        let line = printed
            .recv_timeout(Duration::from_secs(10))
            .expect("reporter went quiet");
        let count = line
            .strip_suffix(" requests per second")
            .expect("unexpected report format")
            .parse()
            .unwrap();
        counts.push(count);
    }
    interrupt.send(()).unwrap();

    let summary = runner.join().unwrap().unwrap();
    (counts, summary)
}

fn drain(received: &Receiver<Captured>) -> Vec<Captured> {
    received.try_iter().collect()
}

#[test]
fn single_shot_sends_exactly_one_request() -> Result<()> {
    let (addr, received) = http_server(200, "pong")?;
    let config = ConfigBuilder::new(&format!("http://{}/ping", addr)).build();
    let (_interrupt, interrupted) = unbounded();
    let mut out = vec![];

    let summary = go(&config, HttpConnector::new(), &interrupted, &mut out)?;

    assert_eq!(summary.stats.attempts, 1);
    assert_eq!(summary.stats.completed, 1);
    assert!(out.is_empty(), "single shot must not report");

    let request = received.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/ping");
    thread::sleep(Duration::from_millis(100));
    assert!(drain(&received).is_empty());

    Ok(())
}

#[test]
fn headers_and_body_are_passed_through() -> Result<()> {
    let (addr, received) = http_server(201, "")?;
    let config = ConfigBuilder::new(&format!("http://{}/things", addr))
        .method("POST")
        .headers(Some(r#"{"X-Token": "abc"}"#.to_string()))
        .data(Some(r#"{ "name": "ping" }"#.to_string()))
        .build();
    let (_interrupt, interrupted) = unbounded();

    go(&config, HttpConnector::new(), &interrupted, io::sink())?;

    let request = received.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.header("x-token"), Some("abc"));
    assert_eq!(request.body, r#"{"name":"ping"}"#);

    Ok(())
}

#[test]
fn malformed_headers_and_body_are_dropped() -> Result<()> {
    let (addr, received) = http_server(200, "")?;
    let config = ConfigBuilder::new(&format!("http://{}/", addr))
        .method("put")
        .headers(Some("X-Token: abc".to_string()))
        .data(Some("{oops".to_string()))
        .build();
    let (_interrupt, interrupted) = unbounded();

    let summary = go(&config, HttpConnector::new(), &interrupted, io::sink())?;
    assert_eq!(summary.stats.completed, 1);

    let request = received.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(request.method, "PUT");
    assert_eq!(request.header("x-token"), None);
    assert!(request.body.is_empty());

    Ok(())
}

#[test]
fn refused_connection_is_not_fatal() -> Result<()> {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?
    };
    let config = ConfigBuilder::new(&format!("http://{}/", addr)).build();
    let (_interrupt, interrupted) = unbounded();

    let summary = go(&config, HttpConnector::new(), &interrupted, io::sink())?;

    assert_eq!(summary.stats.attempts, 1);
    assert_eq!(summary.stats.errors, 1);
    assert_eq!(summary.stats.completed, 0);

    Ok(())
}

#[test]
fn slow_responses_time_out() -> Result<()> {
    let (addr, _received) = http_server_with_delay(200, "late", Duration::from_secs(3))?;
    let config = ConfigBuilder::new(&format!("http://{}/", addr))
        .timeout(Duration::from_millis(200))
        .build();
    let (_interrupt, interrupted) = unbounded();

    let start = Instant::now();
    let summary = go(&config, HttpConnector::new(), &interrupted, io::sink())?;

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(summary.stats.errors, 1);
    assert_eq!(summary.stats.completed, 0);

    Ok(())
}

#[test]
fn reports_add_up_across_workers() -> io::Result<()> {
    let (addr, received) = http_server(200, "pong")?;
    let config = ConfigBuilder::new(&format!("http://{}/ping", addr))
        .repeat(true)
        .workers(3)
        .period(Duration::from_millis(100))
        .build();

    let (counts, summary) = run_for_reports(config, 3);
    let reported: u64 = counts.iter().sum();

    assert_eq!(summary.workers, 3);
    assert_eq!(summary.crashed, 0);
    assert_eq!(summary.stats.errors, 0);
    assert_eq!(drain(&received).len() as u64, summary.stats.completed);
    // three workers at ten requests a second for the two seconds between reports
    assert!(reported >= 40, "only {} reported", reported);
    // whatever was not reported completed after the last report, at most one
    // attempt per worker plus the interrupt latency
    assert!(reported <= summary.stats.completed);
    assert!(summary.stats.completed - reported <= 9);

    Ok(())
}

#[test]
fn server_errors_keep_the_loop_going() -> io::Result<()> {
    let (addr, received) = http_server(500, "database on fire")?;
    let config = ConfigBuilder::new(&format!("http://{}/", addr))
        .repeat(true)
        .period(Duration::from_millis(50))
        .build();

    let (counts, summary) = run_for_reports(config, 2);

    assert!(counts[1] > 1);
    assert!(summary.stats.completed > 1);
    assert_eq!(summary.stats.failures, summary.stats.completed);
    assert_eq!(summary.stats.errors, 0);
    assert_eq!(drain(&received).len() as u64, summary.stats.completed);

    Ok(())
}
