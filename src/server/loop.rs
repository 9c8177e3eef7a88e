// Server loop module
// Owns the listening socket, accepts connections until shutdown, then drains

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::connection::{serve_connection, ConnectionOptions};
use super::listener::create_listener;
use super::signal::ShutdownSignals;
use crate::config::{Config, ServeState};
use crate::error::ServerError;
use crate::logger;

/// A bound, not yet running server.
///
/// The listening socket belongs to this value; it is closed when `run`
/// returns or when the server is dropped without running.
pub struct Server {
    listener: TcpListener,
    state: Arc<ServeState>,
    options: ConnectionOptions,
    shutdown_timeout: Duration,
}

impl Server {
    /// Resolve the root directory and bind the listening socket.
    ///
    /// Fails without retrying if the port is taken. Must be called from
    /// within a tokio runtime.
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let root = config.resolve_root()?;
        let addr = config.socket_addr()?;
        let listener = create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            state: Arc::new(ServeState::new(config, root)),
            options: ConnectionOptions::from(&config.performance),
            shutdown_timeout: Duration::from_secs(config.performance.shutdown_timeout),
        })
    }

    /// The address actually bound, useful when the configured port is 0
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The canonical directory being served
    pub fn root(&self) -> &Path {
        &self.state.root
    }

    /// Serve until SIGINT or SIGTERM (Ctrl+C on Windows). A second signal
    /// while connections drain stops waiting for them.
    pub async fn run(self) -> Result<(), ServerError> {
        let mut signals = ShutdownSignals::install().map_err(ServerError::Signal)?;
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = first_tx.send(signals.recv().await);
            let _ = second_tx.send(signals.recv().await);
        });

        let shutdown = async move {
            if let Ok(name) = first_rx.await {
                logger::log_shutdown_requested(name);
            }
        };
        let force = async move {
            match second_rx.await {
                Ok(name) => logger::log_warning(&format!(
                    "{name} received again, closing open connections"
                )),
                Err(_) => std::future::pending().await,
            }
        };
        self.serve(shutdown, force).await;
        Ok(())
    }

    /// Serve until `shutdown` completes.
    ///
    /// Once it does, no new connections are accepted, open connections
    /// finish their current response, and the call returns after they
    /// close or the shutdown timeout passes.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.serve(shutdown, std::future::pending()).await;
    }

    /// Accept until `shutdown`, then drain until the connections close, the
    /// timeout passes, or `force` completes
    async fn serve<F, G>(self, shutdown: F, force: G)
    where
        F: Future<Output = ()>,
        G: Future<Output = ()>,
    {
        let Self {
            listener,
            state,
            options,
            shutdown_timeout,
        } = self;

        match listener.local_addr() {
            Ok(addr) => logger::log_server_start(&addr, &state.root),
            Err(e) => logger::log_warning(&format!("Cannot read bound address: {e}")),
        }

        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            serve_connection(stream, peer_addr, &state, options, &graceful);
                        }
                        Err(e) => {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                        }
                    }
                }

                () = &mut shutdown => break,
            }
        }

        // Stop accepting before waiting on open connections
        drop(listener);

        tokio::select! {
            () = graceful.shutdown() => {}
            () = tokio::time::sleep(shutdown_timeout) => {
                logger::log_warning(&format!(
                    "Connections still open after {}s, closing anyway",
                    shutdown_timeout.as_secs()
                ));
            }
            () = force => {}
        }

        logger::log_server_stopped();
    }
}
