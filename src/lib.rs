//! Local static file server that disables all client and proxy caching.
//!
//! Every response, whatever its path or status, carries
//!
//! ```text
//! Cache-Control: no-store, no-cache, must-revalidate, max-age=0
//! Pragma: no-cache
//! Expires: 0
//! ```
//!
//! so a browser always fetches the file as it is on disk right now.

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use error::ServerError;
pub use server::Server;
