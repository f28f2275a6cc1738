use std::path::Path;

use clap::{App, Arg, ArgMatches};
use crossbeam_channel::unbounded;
use log::LevelFilter;

use curloop::config::{parse_period, parse_timeout};
use curloop::{setup_logger, Config, ConfigBuilder, Error, FileConfig, HttpConnector, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("curloop: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = cli().get_matches();
    let config = settings_from_argmatches(&matches)?;

    let log_level = if matches.is_present("silent") {
        LevelFilter::Error
    } else {
        match matches.occurrences_of("v") {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    setup_logger(log_level, config.log_file.as_deref())?;

    // catch interrupt and gracefully shut down worker threads
    let (interrupt, interrupted) = unbounded();
    ctrlc::set_handler(move || {
        interrupt.send(()).ok();
    })?;

    curloop::go(&config, HttpConnector::new(), &interrupted, std::io::stdout())?;

    Ok(())
}

fn cli() -> App<'static, 'static> {
    App::new("curloop")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sends an HTTP request, once or at a steady rate from several workers")
        .arg(
            Arg::with_name("url")
                .help("URL to request")
                .index(1)
                .required_unless("config"),
        )
        .arg(
            Arg::with_name("method")
                .short("X")
                .help("HTTP method [default: GET]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("headers")
                .short("H")
                .help("Headers as a JSON object")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("data")
                .short("d")
                .help("Request body as JSON")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("loop")
                .long("loop")
                .help("Keep sending until interrupted and report requests per second"),
        )
        .arg(
            Arg::with_name("period")
                .long("period")
                .help("Seconds between requests on each worker, or e.g. 250ms [default: 0.1]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("workers")
                .long("workers")
                .help("Number of worker threads, 0 for one per CPU [default: 1]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .help("Per-request timeout [default: 5]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("stagger")
                .long("stagger")
                .help("Spread worker start times across the first period"),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .help("TOML file with any of the above settings")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("log-file")
                .long("log-file")
                .help("Also write logs to this file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("silent")
                .short("s")
                .help("Only log errors; hides failed response bodies"),
        )
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity"),
        )
}

/// Config file first, then anything given on the command line.
fn settings_from_argmatches(matches: &ArgMatches) -> Result<Config> {
    let mut builder = ConfigBuilder::new("");

    if let Some(path) = matches.value_of("config") {
        builder = builder.file(FileConfig::load(Path::new(path))?)?;
    }
    if let Some(url) = matches.value_of("url") {
        builder = builder.url(url);
    }
    if let Some(method) = matches.value_of("method") {
        builder = builder.method(method);
    }
    if let Some(headers) = matches.value_of("headers") {
        builder = builder.headers(Some(headers.to_string()));
    }
    if let Some(data) = matches.value_of("data") {
        builder = builder.data(Some(data.to_string()));
    }
    if matches.is_present("loop") {
        builder = builder.repeat(true);
    }
    if let Some(period) = matches.value_of("period") {
        builder = builder.period(parse_period(period)?);
    }
    if let Some(workers) = matches.value_of("workers") {
        let workers = workers
            .parse::<usize>()
            .map_err(|_| Error::InvalidWorkers(workers.to_string()))?;
        builder = builder.workers(workers);
    }
    if let Some(timeout) = matches.value_of("timeout") {
        builder = builder.timeout(parse_timeout(timeout)?);
    }
    if matches.is_present("stagger") {
        builder = builder.stagger(true);
    }
    if let Some(log_file) = matches.value_of("log-file") {
        builder = builder.log_file(Some(log_file.into()));
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Result<Config> {
        let matches = cli().get_matches_from_safe(args).unwrap();
        settings_from_argmatches(&matches)
    }

    #[test]
    fn single_shot_defaults() {
        let config = parse(&["curloop", "http://example.test/ping"]).unwrap();
        assert_eq!(config, Config::new("http://example.test/ping"));
    }

    #[test]
    fn loop_flags() {
        let config = parse(&[
            "curloop",
            "-X",
            "post",
            "-H",
            r#"{"X-Token": "abc"}"#,
            "-d",
            r#"{"a": 1}"#,
            "--loop",
            "--period",
            "0.5",
            "--workers",
            "3",
            "--timeout",
            "2s",
            "http://example.test/ping",
        ])
        .unwrap();

        assert_eq!(config.method, "post");
        assert_eq!(config.headers.as_deref(), Some(r#"{"X-Token": "abc"}"#));
        assert_eq!(config.data.as_deref(), Some(r#"{"a": 1}"#));
        assert!(config.repeat);
        assert_eq!(config.period, Duration::from_millis(500));
        assert_eq!(config.workers, 3);
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[test]
    fn bad_numbers_are_errors() {
        assert!(matches!(
            parse(&["curloop", "--workers", "many", "http://x.test"]),
            Err(Error::InvalidWorkers(_))
        ));
        assert!(matches!(
            parse(&["curloop", "--period=-1", "http://x.test"]),
            Err(Error::InvalidPeriod(_))
        ));
    }

    #[test]
    fn url_is_required_without_a_config_file() {
        assert!(cli().get_matches_from_safe(&["curloop"]).is_err());
    }
}
