use clap::Parser;
use std::process::ExitCode;

use nocache_devserver::cli::Cli;
use nocache_devserver::config::Config;
use nocache_devserver::{logger, Server, ServerError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), ServerError> {
    let cfg = Config::load(cli.config.as_deref(), &cli.overrides())?;
    logger::init(&cfg.logging).map_err(ServerError::Logger)?;

    // Build the Tokio runtime, honoring the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers.filter(|&w| w > 0) {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build().map_err(ServerError::Runtime)?;

    runtime.block_on(async {
        let server = Server::bind(&cfg)?;
        server.run().await
    })
}
