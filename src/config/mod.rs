// Configuration module entry point
// Loads layered configuration and resolves the listen address and served root

mod state;
mod types;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use crate::error::ServerError;

// Re-export public types
pub use state::ServeState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "devserver";

/// Environment variable prefix, e.g. `DEVSERVER_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "DEVSERVER";

/// Values supplied on the command line; they win over every other source
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<PathBuf>,
}

impl Config {
    /// Load configuration: defaults, then the config file, then the
    /// environment, then command-line overrides.
    ///
    /// An explicit `config_path` must exist; the default file is optional.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self, config::ConfigError> {
        let file = match config_path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8001)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "short")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("performance.shutdown_timeout", 5)?
            .set_default("http.server_name", concat!("nocache-devserver/", env!("CARGO_PKG_VERSION")))?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option(
                "server.root",
                overrides
                    .root
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .build()?;

        settings.try_deserialize()
    }

    /// Resolve `host:port` to the socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let invalid = |reason: String| ServerError::InvalidAddress {
            addr: format!("{}:{}", self.server.host, self.server.port),
            reason,
        };

        (self.server.host.as_str(), self.server.port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("host resolved to no addresses".to_string()))
    }

    /// Resolve the served root to an absolute, canonical directory.
    ///
    /// Without an explicit root this is the directory containing the
    /// running executable, so the result does not depend on the working
    /// directory the process was started from.
    pub fn resolve_root(&self) -> Result<PathBuf, ServerError> {
        let candidate = match &self.server.root {
            Some(root) => root.clone(),
            None => executable_dir()?,
        };

        let canonical = candidate
            .canonicalize()
            .map_err(|source| ServerError::RootDir {
                path: candidate.clone(),
                source,
            })?;

        if !canonical.is_dir() {
            return Err(ServerError::RootNotDirectory { path: canonical });
        }
        Ok(canonical)
    }
}

fn executable_dir() -> Result<PathBuf, ServerError> {
    let exe = std::env::current_exe().map_err(|source| ServerError::RootDir {
        path: PathBuf::from("<current executable>"),
        source,
    })?;
    match exe.parent() {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Err(ServerError::RootNotDirectory { path: exe }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_with(overrides: &Overrides) -> Config {
        Config::load(None, overrides).expect("config should load")
    }

    #[test]
    fn test_defaults() {
        let cfg = load_with(&Overrides::default());
        assert_eq!(cfg.server.port, 8001);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "short");
        assert_eq!(cfg.http.index_files, vec!["index.html", "index.htm"]);
        assert!(cfg.http.server_name.starts_with("nocache-devserver/"));
    }

    #[test]
    fn test_overrides_win() {
        let cfg = load_with(&Overrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(9123),
            root: Some(PathBuf::from("/tmp")),
        });
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9123);
        assert_eq!(cfg.server.root, Some(PathBuf::from("/tmp")));
        assert_eq!(
            cfg.socket_addr().unwrap(),
            "127.0.0.1:9123".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let missing = Path::new("/definitely/not/here/devserver.toml");
        assert!(Config::load(Some(missing), &Overrides::default()).is_err());
    }

    #[test]
    fn test_config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[server]\nport = 8555\n\n[http]\nindex_files = [\"home.html\"]\n",
        )
        .unwrap();

        let cfg = Config::load(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(cfg.server.port, 8555);
        assert_eq!(cfg.http.index_files, vec!["home.html"]);
    }

    #[test]
    fn test_invalid_host() {
        let cfg = load_with(&Overrides {
            host: Some(String::new()),
            ..Overrides::default()
        });
        assert!(matches!(
            cfg.socket_addr(),
            Err(ServerError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_resolve_root_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_with(&Overrides {
            root: Some(dir.path().to_path_buf()),
            ..Overrides::default()
        });
        let root = cfg.resolve_root().unwrap();
        assert!(root.is_absolute());
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_resolve_root_defaults_to_executable_dir() {
        let cfg = load_with(&Overrides::default());
        let root = cfg.resolve_root().unwrap();
        let exe_dir = std::env::current_exe()
            .unwrap()
            .parent()
            .unwrap()
            .canonicalize()
            .unwrap();
        assert_eq!(root, exe_dir);
    }

    #[test]
    fn test_resolve_root_rejects_missing_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_with(&Overrides {
            root: Some(dir.path().join("nope")),
            ..Overrides::default()
        });
        assert!(matches!(
            missing.resolve_root(),
            Err(ServerError::RootDir { .. })
        ));

        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        let not_dir = load_with(&Overrides {
            root: Some(file),
            ..Overrides::default()
        });
        assert!(matches!(
            not_dir.resolve_root(),
            Err(ServerError::RootNotDirectory { .. })
        ));
    }
}
