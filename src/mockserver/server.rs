//! Fixture-serving HTTP endpoint that records what it receives.
//!
//! Each `MockServer` owns one listening socket and one worker thread.
//! Dropping the handle unblocks the worker, joins it and closes the socket,
//! so endpoints are released on every exit path of a scenario.

use super::request::RecordedRequest;
use crate::utils::error::MockServerError;
use log::{debug, warn};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::net::TcpListener;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tiny_http::{Header, Request, Response, Server};

/// Headers attached to every fixture response
///
/// The engine refuses bidding/decision scripts and ad renders without
/// these opt-ins.
const FIXTURE_HEADERS: &[(&str, &str)] = &[
    ("Ad-Auction-Allowed", "true"),
    ("X-Allow-FLEDGE", "true"),
    ("Supports-Loading-Mode", "fenced-frame"),
    ("Cache-Control", "no-store"),
];

/// Upper bound on waiting for the listening socket to close after drop
const RELEASE_TIMEOUT: Duration = Duration::from_millis(500);

/// Mock endpoint bound to one port
pub struct MockServer {
    server: Option<Arc<Server>>,
    port: u16,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    worker: Option<JoinHandle<()>>,
}

impl MockServer {
    /// Bind a port and start serving `directory`
    ///
    /// **Public** - port `0` picks a free port
    ///
    /// # Errors
    /// * `MockServerError::MissingFixtures` - `directory` does not exist
    /// * `MockServerError::Bind` - Port unavailable
    pub fn bind(port: u16, directory: impl Into<PathBuf>) -> Result<Self, MockServerError> {
        let directory = directory.into();
        if !directory.is_dir() {
            return Err(MockServerError::MissingFixtures(directory.display().to_string()));
        }

        let server = Server::http(("127.0.0.1", port)).map_err(|e| MockServerError::Bind {
            port,
            message: e.to_string(),
        })?;

        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| MockServerError::Bind {
                port,
                message: "listener has no IP address".to_string(),
            })?;

        let server = Arc::new(server);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let worker = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            let directory = directory.clone();
            std::thread::Builder::new()
                .name(format!("mockserver-{}", port))
                .spawn(move || {
                    for request in server.incoming_requests() {
                        handle_request(request, &directory, &requests);
                    }
                })
                .map_err(|e| MockServerError::Bind {
                    port,
                    message: format!("cannot spawn worker: {}", e),
                })?
        };

        debug!("Mock server on port {} serving {}", port, directory.display());

        Ok(Self {
            server: Some(server),
            port,
            requests,
            worker: Some(worker),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL the browser reaches this endpoint at
    pub fn address(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Snapshot of every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Most recent request for `path`
    ///
    /// # Errors
    /// * `MockServerError::NoRequest` - Nothing received on that path
    pub fn get_last_request(&self, path: &str) -> Result<RecordedRequest, MockServerError> {
        lock(&self.requests)
            .iter()
            .rev()
            .find(|r| r.path == path)
            .cloned()
            .ok_or_else(|| MockServerError::NoRequest(format!("{}{}", self.address(), path)))
    }

    /// Release the endpoint now instead of at end of scope
    pub fn shutdown(self) {}
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(server) = &self.server {
            server.unblock();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Mock server worker on port {} panicked", self.port);
            }
        }

        // The listener is closed by tiny_http's own accept thread
        self.server = None;
        if wait_for_release(self.port, RELEASE_TIMEOUT) {
            debug!("Mock server on port {} released", self.port);
        } else {
            warn!("Port {} still bound {:?} after shutdown", self.port, RELEASE_TIMEOUT);
        }
    }
}

/// Poll until `port` can be bound again
fn wait_for_release(port: u16, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if TcpListener::bind(("127.0.0.1", port)).is_ok() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Lock the request log, recovering from a poisoned mutex
fn lock(requests: &Mutex<Vec<RecordedRequest>>) -> MutexGuard<'_, Vec<RecordedRequest>> {
    requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Record one request and answer it from the fixture directory
///
/// **Private** - runs on the worker thread
fn handle_request(mut request: Request, directory: &Path, requests: &Mutex<Vec<RecordedRequest>>) {
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        warn!("Failed to read request body: {}", e);
    }

    let recorded = RecordedRequest::new(request.method().to_string(), request.url(), body);
    debug!("{} {}?{}", recorded.method, recorded.path, recorded.query);

    let response = match resolve_fixture(directory, &recorded.path) {
        Some(file) => match std::fs::read(&file) {
            Ok(content) => fixture_response(content, content_type(&file)),
            Err(e) => {
                warn!("Failed to read fixture {}: {}", file.display(), e);
                Response::from_data(b"fixture unreadable".to_vec()).with_status_code(500)
            }
        },
        None => Response::from_data(b"not found".to_vec()).with_status_code(404),
    };

    lock(requests).push(recorded);

    if let Err(e) = request.respond(response) {
        warn!("Failed to send response: {}", e);
    }
}

fn fixture_response(content: Vec<u8>, content_type: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response = Response::from_data(content);
    let headers = FIXTURE_HEADERS
        .iter()
        .copied()
        .chain(std::iter::once(("Content-Type", content_type)));

    for (name, value) in headers {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            response.add_header(header);
        }
    }
    response
}

/// Map a request path to a file under `directory`
///
/// `/` and directory paths serve `index.html`. Paths escaping the
/// directory or naming missing files yield `None`.
pub(crate) fn resolve_fixture(directory: &Path, path: &str) -> Option<PathBuf> {
    let relative = path.trim_start_matches('/');
    let relative = Path::new(relative);

    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let mut file = directory.join(relative);
    if file.is_dir() {
        file = file.join("index.html");
    }

    file.is_file().then_some(file)
}

fn content_type(file: &Path) -> &'static str {
    match file.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("css") => "text/css",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}
