//! Minimal HTTP/1.1 JSON API server for integration tests.
//!
//! Each route answers with a scripted sequence of `(status, body)` pairs; the
//! last pair repeats once the script runs out. Unknown paths return 404. The
//! server counts hits per path, remembers the last request's request line,
//! header lines and body, and tracks peak concurrent requests.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Route {
    script: Vec<(u16, String)>,
    delay: Duration,
}

#[derive(Default)]
struct State {
    routes: Mutex<HashMap<String, Route>>,
    hits: Mutex<HashMap<String, usize>>,
    headers: Mutex<HashMap<String, Vec<String>>>,
    request_lines: Mutex<HashMap<String, String>>,
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

pub struct ApiServer {
    base: String,
    state: Arc<State>,
}

impl ApiServer {
    /// Starts a server in a background thread. It runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(State::default());
        let accept_state = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&accept_state);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn route(&self, path: &str, script: &[(u16, &str)]) {
        self.route_with_delay(path, script, Duration::ZERO);
    }

    pub fn route_with_delay(&self, path: &str, script: &[(u16, &str)], delay: Duration) {
        let script = script
            .iter()
            .map(|(code, body)| (*code, body.to_string()))
            .collect();
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Route { script, delay });
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().unwrap().values().sum()
    }

    /// Header lines (without the request line) of the last request to `path`.
    pub fn last_headers(&self, path: &str) -> Vec<String> {
        self.state
            .headers
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// Request line (e.g. `GET /x HTTP/1.1`) of the last request to `path`.
    pub fn last_request_line(&self, path: &str) -> Option<String> {
        self.state.request_lines.lock().unwrap().get(path).cloned()
    }

    /// Body of the last request to `path` (empty when none was sent).
    pub fn last_body(&self, path: &str) -> Vec<u8> {
        self.state
            .bodies
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }
}

/// A URL on localhost where nothing is listening (connection refused).
pub fn refused_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Reads the request head and any `Content-Length` body.
fn read_request(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    };
    let head = String::from_utf8(data[..head_end].to_vec()).ok()?;
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = data[head_end..].to_vec();
    while body.len() < content_length {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&buf[..n]),
        }
    }
    body.truncate(content_length);
    Some((head, body))
}

fn handle(mut stream: TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let (head, body) = match read_request(&mut stream) {
        Some(request) => request,
        None => return,
    };
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or("");
    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or("/").to_string();
    let header_lines: Vec<String> = lines
        .take_while(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    let attempt = {
        let mut hits = state.hits.lock().unwrap();
        let n = hits.entry(path.clone()).or_insert(0);
        *n += 1;
        *n - 1
    };
    state
        .headers
        .lock()
        .unwrap()
        .insert(path.clone(), header_lines);
    state
        .request_lines
        .lock()
        .unwrap()
        .insert(path.clone(), request_line.to_string());
    state.bodies.lock().unwrap().insert(path.clone(), body);
    let route = state.routes.lock().unwrap().get(&path).cloned();

    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.peak.fetch_max(now, Ordering::SeqCst);

    let (status, body, delay) = match route {
        Some(route) if !route.script.is_empty() => {
            let (code, body) = route.script[attempt.min(route.script.len() - 1)].clone();
            (code, body, route.delay)
        }
        _ => (404, r#"{"status":{"message":"Not found","status_code":404}}"#.to_string(), Duration::ZERO),
    };
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    // Leave the in-flight set before answering so the next wave cannot overlap.
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    let response = format!(
        "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
