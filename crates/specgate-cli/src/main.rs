//! specgate entry point.

use std::process::ExitCode;

use clap::Parser;
use specgate_cli::{Cli, CliError, bootstrap, load_config, logging, run};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads SPECGATE_* defaults
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match start(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn start(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli.config)?;
    let _guard = logging::init(&config.gateway, cli.verbose)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    let app = bootstrap(&cli, &config).await?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C, shutdown on signal disabled: {e}"),
        }
    });

    run(app, cancel).await
}
