//! BC Deployer console - Entry Point
//!
//! Manages projects, uploads .app packages and follows deployments against
//! the deployer backend.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use bcdeploy::app::options::AppOptions;
use bcdeploy::app::run::run;
use bcdeploy::app::state::AppState;
use bcdeploy::cli::{Cli, Command};
use bcdeploy::filesys::file::File;
use bcdeploy::logs::init_logging;
use bcdeploy::storage::settings::load_settings;
use bcdeploy::utils::version_info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match try_main(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn try_main(cli: Cli) -> anyhow::Result<ExitCode> {
    // Print version without touching settings or the network
    if let Command::Version = cli.command {
        println!("{}", serde_json::to_string_pretty(&version_info())?);
        return Ok(ExitCode::SUCCESS);
    }

    let settings_file = cli.settings.as_ref().map(File::new);
    let settings = load_settings(settings_file.as_ref())
        .await
        .context("Unable to read settings file")?;

    let mut options = AppOptions::from_settings(&settings, cli.api_base_url.as_deref())
        .context("Invalid configuration")?;
    if let Some(level) = cli.log_level {
        options.log.log_level = level;
    }
    options.log.log_level = options.log.log_level.raised_by(cli.verbose);
    options.log.json_format |= cli.json_logs;

    if let Err(e) = init_logging(options.log.clone()) {
        eprintln!("Failed to initialize logging: {e}");
    }
    info!("Running bcdeploy with options: {:?}", options);

    let state = AppState::init(options).context("Failed to initialize the console")?;
    let code = run(&state, cli.command, await_shutdown_signal()).await?;
    Ok(code)
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to install signal handlers: {}", e);
                std::future::pending::<()>().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received, shutting down...");
    }
}
