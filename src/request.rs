//! The immutable description of the request every worker sends.
//!
//! Headers and body arrive as raw JSON text. Both are parsed leniently: anything that
//! isn't valid JSON (or, for headers, isn't a JSON object) is treated as absent rather
//! than rejected.

use std::fmt;
use std::str::FromStr;

use log::debug;
use reqwest::Url;
use serde_json::Value;

use crate::{Error, Result};

/// HTTP verbs the request loop can dispatch on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Normalized lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Options => "options",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Method> {
        match s.trim().to_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "patch" => Ok(Method::Patch),
            "delete" => Ok(Method::Delete),
            "head" => Ok(Method::Head),
            "options" => Ok(Method::Options),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// One HTTP call, built once per process and shared read-only by every worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Option<Vec<(String, String)>>,
    body: Option<String>,
}

impl Request {
    pub fn new(method: Method, url: &str) -> Result<Request> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Request {
            method,
            url,
            headers: None,
            body: None,
        })
    }

    /// Builds a request from the raw strings handed over by the CLI or config file.
    /// The method and url must be valid; headers and body degrade to absent.
    pub fn from_raw(
        method: &str,
        url: &str,
        headers: Option<&str>,
        body: Option<&str>,
    ) -> Result<Request> {
        let mut request = Request::new(method.parse()?, url)?;
        request.headers = parse_headers(headers);
        request.body = parse_body(body);
        Ok(request)
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Request {
        self.headers = Some(headers);
        self
    }

    pub fn with_body<S: Into<String>>(mut self, body: S) -> Request {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> Option<&[(String, String)]> {
        self.headers.as_deref()
    }

    /// Pre-serialized JSON payload.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Parses a JSON object of header names to values. Non-string values keep their JSON
/// text and `null` values are left out. Returns `None` for missing input, invalid JSON
/// or a non-object document.
pub fn parse_headers(raw: Option<&str>) -> Option<Vec<(String, String)>> {
    let raw = raw?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(
            map.into_iter()
                .filter_map(|(name, value)| match value {
                    Value::Null => None,
                    Value::String(s) => Some((name, s)),
                    other => Some((name, other.to_string())),
                })
                .collect(),
        ),
        Ok(_) => {
            debug!("headers are not a JSON object, sending none");
            None
        }
        Err(e) => {
            debug!("headers are not valid JSON ({}), sending none", e);
            None
        }
    }
}

/// Parses the body as JSON and re-serializes it compactly. Returns `None` for missing
/// or invalid input.
pub fn parse_body(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Some(value.to_string()),
        Err(e) => {
            debug!("body is not valid JSON ({}), sending none", e);
            None
        }
    }
}
