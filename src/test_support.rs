//! Test doubles: a scripted [`HttpFetch`], in-memory sinks and a minimal
//! HTTP/1.1 server.

use crate::error::{FetchError, SinkError};
use crate::fetch::{FetchedPage, HttpFetch};
use crate::models::OutputRecord;
use crate::outputs::RecordSink;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// [`HttpFetch`] answering from a fixed table and recording every request.
#[derive(Debug, Default)]
pub struct ScriptedFetch {
    responses: HashMap<String, Result<FetchedPage, FetchError>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Ok(FetchedPage {
                status,
                body: body.to_string(),
            }),
        );
        self
    }

    pub fn fail(mut self, url: &str, message: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Err(FetchError::Request(message.to_string())),
        );
        self
    }

    /// Every URL requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }
}

impl HttpFetch for ScriptedFetch {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        // Query strings are ignored when no exact entry exists.
        let key = if self.responses.contains_key(url) {
            url
        } else {
            url.split('?').next().unwrap_or(url)
        };
        self.responses
            .get(key)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Request(format!("no scripted response for {url}"))))
    }
}

/// [`RecordSink`] collecting records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<OutputRecord>,
    pub finished: bool,
}

impl RecordSink for MemorySink {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}

/// [`RecordSink`] rejecting the records whose URL is listed in `reject`.
#[derive(Debug, Default)]
pub struct FlakySink {
    pub reject: Vec<String>,
    pub records: Vec<OutputRecord>,
}

impl RecordSink for FlakySink {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), SinkError> {
        if self.reject.contains(&record.url) {
            return Err(SinkError::Flush(std::io::Error::other("disk full")));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A canned response served by [`TestServer`].
#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Route {
    pub fn html(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    /// Arbitrary bytes under an explicit `Content-Type`.
    pub fn raw(status: u16, content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }
}

/// HTTP server on a background thread, routing on the request path.
///
/// Unknown paths answer 404. The server runs until the process exits.
pub struct TestServer {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub fn start(routes: Vec<(&str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let routes: Arc<HashMap<String, Route>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, route)| (path.to_string(), route))
                .collect(),
        );
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let log = Arc::clone(&log);
                thread::spawn(move || handle(stream, &routes, &log));
            }
        });

        Self {
            base: format!("http://127.0.0.1:{port}"),
            requests,
        }
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Request targets (path and query) received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// A URL on a port nothing is listening on.
    pub fn unreachable_url(path: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}{path}")
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, log: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let request = String::from_utf8_lossy(&request);
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    log.lock().unwrap().push(target.clone());

    let path = target.split('?').next().unwrap_or("/");
    let route = routes
        .get(path)
        .cloned()
        .unwrap_or_else(|| Route::html(404, "not found"));

    let head = format!(
        "HTTP/1.1 {} Test\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status,
        route.content_type,
        route.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&route.body);
}
