use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported method '{0}'")]
    InvalidMethod(String),

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid period '{0}': expected seconds (e.g. 0.1) or a duration (e.g. 100ms)")]
    InvalidPeriod(String),

    #[error("invalid worker count '{0}'")]
    InvalidWorkers(String),

    #[error("invalid timeout '{0}'")]
    InvalidTimeout(String),

    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),

    #[error("failed to set up logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("failed to install interrupt handler: {0}")]
    Interrupt(#[from] ctrlc::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
