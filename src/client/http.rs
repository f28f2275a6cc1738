use std::time::Duration;

use log::trace;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::client::{Connector, Response, Session};
use crate::request::Method;
use crate::{Error, Request, Result};

/// Opens one `reqwest` blocking client per attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl HttpConnector {
    pub fn new() -> HttpConnector {
        HttpConnector
    }
}

impl Connector for HttpConnector {
    type Session = HttpSession;

    fn open(&self) -> Result<HttpSession> {
        let client = Client::builder().pool_max_idle_per_host(0).build()?;
        Ok(HttpSession { client })
    }
}

/// Owns the client for a single attempt; dropping the session closes its connections.
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
}

impl Session for HttpSession {
    fn send(&mut self, request: &Request, timeout: Duration) -> Result<Response> {
        let client = &self.client;
        let url = request.url().clone();
        let mut builder = match request.method() {
            Method::Get => client.get(url),
            Method::Post => client.post(url),
            Method::Put => client.put(url),
            Method::Patch => client.patch(url),
            Method::Delete => client.delete(url),
            Method::Head => client.head(url),
            Method::Options => client.request(reqwest::Method::OPTIONS, url),
        };

        builder = builder.timeout(timeout);
        if let Some(headers) = request.headers() {
            builder = builder.headers(header_map(headers)?);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }

        trace!("{} {}", request.method(), request.url());
        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        Ok(Response { status, body })
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeader(name.clone()))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}
