//! The seam between the request loop and the HTTP library.
//!
//! A `Connector` is shared by every worker and hands out a fresh `Session` for each
//! attempt; the session is dropped (and its connections closed) when the attempt ends.

pub mod http;

pub use http::HttpConnector;

use std::time::Duration;

use crate::{Request, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new<S: Into<String>>(status: u16, body: S) -> Response {
        Response {
            status,
            body: body.into(),
        }
    }
}

pub trait Session {
    /// Performs exactly one request, bounded by `timeout`.
    fn send(&mut self, request: &Request, timeout: Duration) -> Result<Response>;
}

pub trait Connector: Send + Sync {
    type Session: Session;

    fn open(&self) -> Result<Self::Session>;
}
