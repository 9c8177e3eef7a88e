// Serving state module
// Read-only values every request handler needs, shared behind an Arc

use std::path::PathBuf;

use super::types::Config;

/// Per-process serving state, built once the root has been resolved
#[derive(Debug, Clone)]
pub struct ServeState {
    /// Absolute, canonical directory that request paths resolve against
    pub root: PathBuf,
    pub index_files: Vec<String>,
    pub server_name: String,
    pub access_log: bool,
    pub access_log_format: String,
}

impl ServeState {
    pub fn new(config: &Config, root: PathBuf) -> Self {
        Self {
            root,
            index_files: config.http.index_files.clone(),
            server_name: config.http.server_name.clone(),
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
        }
    }
}
