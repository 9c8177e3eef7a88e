//! Startup error types
//!
//! Everything that can stop the server before it accepts its first
//! connection. Per-request failures never surface here; they become
//! HTTP status codes in the handler.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Fatal server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid listen address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Cannot use '{}' as root directory: {source}", .path.display())]
    RootDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Root path '{}' is not a directory", .path.display())]
    RootNotDirectory { path: PathBuf },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open log file: {0}")]
    Logger(#[source] io::Error),

    #[error("Failed to build async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] io::Error),
}
