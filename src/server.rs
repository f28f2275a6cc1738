//! Canned HTTP server for testing.
//!
//! Answers every request with the same status and body and hands each request it
//! received back over a channel. Lives in the library so unit tests, integration
//! tests and benches can all share it.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;

/// A request as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub method: String,
    pub path: String,
    /// Header names are lowercased.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    body: String,
    delay: Duration,
}

/// Starts a server on an OS-assigned local port.
pub fn http_server(status: u16, body: &str) -> io::Result<(SocketAddr, Receiver<Captured>)> {
    http_server_with_delay(status, body, Duration::default())
}

/// Like `http_server`, but waits `delay` before answering each request.
pub fn http_server_with_delay(
    status: u16,
    body: &str,
    delay: Duration,
) -> io::Result<(SocketAddr, Receiver<Captured>)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let (captured, received) = unbounded();
    let canned = Canned {
        status,
        body: body.to_string(),
        delay,
    };

    thread::spawn(move || {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    debug!("accept failed: {}", e);
                    continue;
                }
            };
            let canned = canned.clone();
            let captured = captured.clone();
            thread::spawn(move || {
                if let Err(e) = respond(stream, &canned, &captured) {
                    debug!("test server connection failed: {}", e);
                }
            });
        }
    });

    Ok((addr, received))
}

fn respond(stream: TcpStream, canned: &Canned, captured: &Sender<Captured>) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);

    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = vec![];
    let mut content_length = 0;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            let name = name.trim().to_lowercase();
            let value = value.trim().to_string();
            if name == "content-length" {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((name, value));
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;

    captured
        .send(Captured {
            method,
            path,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
        .ok();

    if canned.delay > Duration::default() {
        thread::sleep(canned.delay);
    }

    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        canned.status,
        if canned.status < 400 { "OK" } else { "Error" },
        canned.body.len(),
        canned.body
    )?;
    stream.flush()
}
