//! Common Test Utilities
//!
//! Starts a server on an ephemeral port over a temporary directory and
//! talks plain HTTP/1.1 to it.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use nocache_devserver::config::{Config, Overrides};
use nocache_devserver::Server;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// A running server over its own temporary root
pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Config bound to 127.0.0.1 on an ephemeral port, serving `root`
pub fn test_config(root: &Path, port: u16) -> Config {
    Config::load(
        None,
        &Overrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(port),
            root: Some(root.to_path_buf()),
        },
    )
    .expect("test config should load")
}

/// Root with an index page, a script and a subdirectory without an index
pub fn sample_site() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("index.html"), b"<h1>Tuner</h1>\n").unwrap();
    std::fs::write(root.path().join("app.js"), b"const A4 = 440;\n").unwrap();
    std::fs::create_dir(root.path().join("sounds")).unwrap();
    std::fs::write(root.path().join("sounds/click.wav"), b"RIFF....WAVE").unwrap();
    root
}

impl TestServer {
    pub async fn start(root: TempDir) -> Self {
        let server = Server::bind(&test_config(root.path(), 0)).expect("server should bind");
        let addr = server.local_addr().unwrap();
        let (shutdown, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_until(async {
            let _ = rx.await;
        }));
        Self {
            addr,
            root,
            shutdown,
            handle,
        }
    }

    pub async fn get(&self, path: &str) -> RawResponse {
        self.request("GET", path, &[]).await
    }

    pub async fn request(&self, method: &str, path: &str, headers: &[(&str, &str)]) -> RawResponse {
        send_request(self.addr, method, path, headers).await
    }

    pub fn write_file(&self, name: &str, content: &[u8]) {
        std::fs::write(self.root.path().join(name), content).unwrap();
    }

    /// Trigger shutdown and wait for the serve loop to return
    pub async fn stop(self) -> TempDir {
        let _ = self.shutdown.send(());
        self.handle.await.expect("server task panicked");
        self.root
    }
}

/// Parsed HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Header names lowercased, in wire order
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_count(&self, name: &str) -> usize {
        let name = name.to_ascii_lowercase();
        self.headers.iter().filter(|(n, _)| *n == name).count()
    }

    /// Headers minus `Date`, which changes from second to second
    pub fn stable_headers(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter(|(n, _)| n != "date")
            .cloned()
            .collect()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn assert_no_cache(&self) {
        assert_eq!(self.header("cache-control"), Some(CACHE_CONTROL), "{self:?}");
        assert_eq!(self.header("pragma"), Some("no-cache"), "{self:?}");
        assert_eq!(self.header("expires"), Some("0"), "{self:?}");
    }
}

/// Send one request with `Connection: close` and read the whole reply
pub async fn send_request(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.expect("connect");

    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    parse_response(&raw)
}

/// Send bytes verbatim, for requests no well-behaved client would build
pub async fn send_raw(addr: SocketAddr, bytes: &[u8]) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(bytes).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    parse_response(&raw)
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a header block");
    let head = std::str::from_utf8(&raw[..split]).expect("ASCII headers");
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status code");

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body,
    }
}
