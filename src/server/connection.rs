// Connection handling module
// Serves a single accepted TCP connection on its own task

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;

use super::transport::NoCacheIo;
use crate::config::{PerformanceConfig, ServeState};
use crate::handler;
use crate::http::NoCache;
use crate::logger;

/// HTTP/1 settings applied to every connection
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    pub keep_alive: bool,
    pub header_read_timeout: Duration,
}

impl From<&PerformanceConfig> for ConnectionOptions {
    fn from(config: &PerformanceConfig) -> Self {
        Self {
            keep_alive: config.keep_alive,
            header_read_timeout: Duration::from_secs(config.header_read_timeout),
        }
    }
}

/// Serve a connection in a spawned task.
///
/// The file handler is wrapped in [`NoCache`] and the stream in
/// [`NoCacheIo`], so every response on the connection carries the no-cache
/// headers, including the ones hyper writes for requests it cannot parse. The connection is registered
/// with `graceful` and winds down once shutdown starts.
pub fn serve_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<ServeState>,
    options: ConnectionOptions,
    graceful: &GracefulShutdown,
) {
    let io = TokioIo::new(NoCacheIo::new(stream));

    let mut builder = http1::Builder::new();
    builder
        .keep_alive(options.keep_alive)
        .timer(TokioTimer::new())
        .header_read_timeout(options.header_read_timeout);

    let state = Arc::clone(state);
    let service = NoCache::new(service_fn(move |req: Request<Incoming>| {
        handler::handle_request(req, Arc::clone(&state), peer_addr)
    }));

    let conn = graceful.watch(builder.serve_connection(io, service));

    tokio::spawn(async move {
        if let Err(err) = conn.await {
            // Clients dropping idle keep-alive connections is routine
            if !err.is_incomplete_message() {
                logger::log_connection_error(&err);
            }
        }
    });
}
