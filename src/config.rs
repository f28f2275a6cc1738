use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_derive::Deserialize;

use crate::executor::DEFAULT_TIMEOUT;
use crate::rate::{Mode, RateLoop, DEFAULT_PERIOD};
use crate::{Error, Request, Result};

/// Settings for a run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP verb, case-insensitive.
    pub method: String,
    pub url: String,
    /// Raw JSON object of headers. Anything unparsable is sent as no headers.
    pub headers: Option<String>,
    /// Raw JSON body. Anything unparsable is sent as no body.
    pub data: Option<String>,
    /// Keep sending until interrupted. When false a single request is made.
    pub repeat: bool,
    /// Time between the starts of consecutive requests on one worker.
    pub period: Duration,
    /// Number of worker threads. 0 becomes num_cpus.
    pub workers: usize,
    pub timeout: Duration,
    /// Spread worker start times across the first period.
    pub stagger: bool,
    /// Also write logs to this file.
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn new(url: &str) -> Config {
        Config {
            method: "GET".to_string(),
            url: url.to_string(),
            headers: None,
            data: None,
            repeat: false,
            period: DEFAULT_PERIOD,
            workers: 1,
            timeout: DEFAULT_TIMEOUT,
            stagger: false,
            log_file: None,
        }
    }

    /// Number of user-defined workers, or one per CPU on the host.
    pub fn num_workers(&self) -> usize {
        match self.workers {
            0 => num_cpus::get(),
            n => n,
        }
    }

    pub fn request(&self) -> Result<Request> {
        Request::from_raw(
            &self.method,
            &self.url,
            self.headers.as_deref(),
            self.data.as_deref(),
        )
    }

    pub fn rate_loop(&self) -> RateLoop {
        let mode = if self.repeat { Mode::Repeat } else { Mode::Once };
        RateLoop::new(self.period, mode)
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new(url: &str) -> ConfigBuilder {
        ConfigBuilder {
            config: Config::new(url),
        }
    }

    /// Consume the builder and return the inner object
    pub fn build(self) -> Config {
        self.config
    }

    /// Applies every value present in a config file.
    pub fn file(mut self, file: FileConfig) -> Result<ConfigBuilder> {
        if let Some(url) = file.url {
            self.config.url = url;
        }
        if let Some(method) = file.method {
            self.config.method = method;
        }
        if let Some(headers) = file.headers {
            self.config.headers = headers.into_raw();
        }
        if let Some(data) = file.data {
            self.config.data = data.into_raw();
        }
        if let Some(repeat) = file.repeat {
            self.config.repeat = repeat;
        }
        if let Some(period) = file.period {
            self.config.period = period
                .to_duration()
                .ok_or_else(|| Error::InvalidPeriod(period.to_string()))?;
        }
        if let Some(workers) = file.workers {
            self.config.workers = workers;
        }
        if let Some(timeout) = file.timeout {
            self.config.timeout = timeout
                .to_duration()
                .filter(|t| *t > Duration::ZERO)
                .ok_or_else(|| Error::InvalidTimeout(timeout.to_string()))?;
        }
        if let Some(stagger) = file.stagger {
            self.config.stagger = stagger;
        }
        if let Some(log_file) = file.log_file {
            self.config.log_file = Some(log_file);
        }
        Ok(self)
    }

    pub fn url(mut self, url: &str) -> ConfigBuilder {
        self.config.url = url.to_string();
        self
    }

    pub fn method(mut self, method: &str) -> ConfigBuilder {
        self.config.method = method.to_string();
        self
    }

    pub fn headers(mut self, headers: Option<String>) -> ConfigBuilder {
        self.config.headers = headers;
        self
    }

    pub fn data(mut self, data: Option<String>) -> ConfigBuilder {
        self.config.data = data;
        self
    }

    pub fn repeat(mut self, repeat: bool) -> ConfigBuilder {
        self.config.repeat = repeat;
        self
    }

    pub fn period(mut self, period: Duration) -> ConfigBuilder {
        self.config.period = period;
        self
    }

    pub fn workers(mut self, workers: usize) -> ConfigBuilder {
        self.config.workers = workers;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> ConfigBuilder {
        self.config.timeout = timeout;
        self
    }

    pub fn stagger(mut self, stagger: bool) -> ConfigBuilder {
        self.config.stagger = stagger;
        self
    }

    pub fn log_file(mut self, log_file: Option<PathBuf>) -> ConfigBuilder {
        self.config.log_file = log_file;
        self
    }
}

/// Longest period or timeout accepted from the command line or a config file.
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Parses either plain seconds (`0.25`) or a human duration (`250ms`, `1m 30s`).
/// Anything longer than `MAX_DURATION` is rejected.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    match s.parse::<f64>() {
        Ok(secs) => seconds(secs),
        Err(_) => humantime::parse_duration(s).ok().and_then(bounded),
    }
}

pub fn parse_period(s: &str) -> Result<Duration> {
    parse_duration(s).ok_or_else(|| Error::InvalidPeriod(s.to_string()))
}

pub fn parse_timeout(s: &str) -> Result<Duration> {
    parse_duration(s)
        .filter(|t| *t > Duration::ZERO)
        .ok_or_else(|| Error::InvalidTimeout(s.to_string()))
}

fn seconds(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs >= 0.0 {
        Duration::try_from_secs_f64(secs).ok().and_then(bounded)
    } else {
        None
    }
}

fn bounded(duration: Duration) -> Option<Duration> {
    Some(duration).filter(|d| *d <= MAX_DURATION)
}

/// Contents of an optional TOML config file. Every key is optional.
///
/// ```toml
/// url = "http://localhost:8000/ping"
/// method = "post"
/// loop = true
/// period = "250ms"
/// workers = 4
///
/// [headers]
/// Authorization = "Bearer abc"
///
/// [data]
/// name = "ping"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<JsonValue>,
    pub data: Option<JsonValue>,
    #[serde(rename = "loop")]
    pub repeat: Option<bool>,
    pub period: Option<DurationValue>,
    pub workers: Option<usize>,
    pub timeout: Option<DurationValue>,
    pub stagger: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<FileConfig> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Headers or body given either as raw JSON text or as a TOML table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum JsonValue {
    Raw(String),
    Table(toml::Value),
}

impl JsonValue {
    fn into_raw(self) -> Option<String> {
        match self {
            JsonValue::Raw(raw) => Some(raw),
            JsonValue::Table(table) => serde_json::to_string(&table).ok(),
        }
    }
}

/// A duration given either as seconds or as a human-readable string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(f64),
    Text(String),
}

impl DurationValue {
    fn to_duration(&self) -> Option<Duration> {
        match self {
            DurationValue::Seconds(secs) => seconds(*secs),
            DurationValue::Text(text) => parse_duration(text),
        }
    }
}

impl std::fmt::Display for DurationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationValue::Seconds(secs) => write!(f, "{}", secs),
            DurationValue::Text(text) => f.write_str(text),
        }
    }
}
