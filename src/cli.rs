//! Command-line interface
//!
//! No argument is required; anything given here overrides the config file
//! and environment.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Overrides;

#[derive(Debug, Parser)]
#[command(
    name = "nocache-devserver",
    version,
    about = "Serve a directory over HTTP with all caching disabled"
)]
pub struct Cli {
    /// Port to listen on [default: 8001]
    pub port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(short, long, value_name = "HOST")]
    pub bind: Option<String>,

    /// Directory to serve [default: directory of the executable]
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Config file [default: ./devserver.toml if present]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.bind.clone(),
            port: self.port,
            root: self.root.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["nocache-devserver"]).unwrap();
        let overrides = cli.overrides();
        assert!(overrides.port.is_none());
        assert!(overrides.host.is_none());
        assert!(overrides.root.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_port_and_flags() {
        let cli = Cli::try_parse_from([
            "nocache-devserver",
            "9000",
            "--bind",
            "127.0.0.1",
            "-r",
            "site",
            "--config",
            "dev.toml",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.port, Some(9000));
        assert_eq!(overrides.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(overrides.root, Some(PathBuf::from("site")));
        assert_eq!(cli.config, Some(PathBuf::from("dev.toml")));
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["nocache-devserver", "70000"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
