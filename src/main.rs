//! urlcat - Render web pages to PDF and merge them over HTTP.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use urlcat::cli::Cli;
use urlcat::render::WkHtmlToPdf;
use urlcat::server::Service;
use urlcat::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.to_config()?;

    telemetry::init(config.log_level, config.log_format)?;
    info!(
        op = "main",
        name = urlcat::NAME,
        version = urlcat::VERSION,
        renderer = %config.renderer_bin.display(),
        "Starting"
    );

    let renderer = Arc::new(WkHtmlToPdf::new(config.renderer_bin.clone()));
    let running = Service::start(config, renderer)
        .await
        .context("failed to start HTTP service")?;

    shutdown_signal().await?;
    running.stop().await?;

    Ok(())
}

/// Wait for Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.context("failed to listen for Ctrl+C")?;
                info!(op = "main", "Received Ctrl+C, shutting down");
            }
            _ = terminate.recv() => {
                info!(op = "main", "Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl+C")?;
        info!(op = "main", "Received Ctrl+C, shutting down");
    }

    Ok(())
}
