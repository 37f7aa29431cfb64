//! ym-bridged - standalone daemon bridging a cloud radio API to a local
//! media subprocess.
//!
//! This binary is a thin composition-root caller: it parses a handful of
//! CLI flags, loads configuration, calls into `ym-bridge-core`'s bootstrap,
//! starts the façade, and blocks until asked to shut down. It does not
//! implement the desktop-bus (MPRIS) service or the local control socket
//! server — those are adapters that would sit in front of the façade this
//! binary stands up.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use ym_bridge_core::bootstrap_services;

use crate::config::AppConfig;

/// ym-bridged - bridges a cloud music service's radio API to a local media
/// subprocess over its own control socket.
#[derive(Parser, Debug)]
#[command(name = "ym-bridged")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (TOML). Defaults to
    /// `~/.config/ym-bridge/config.toml`; a missing file is not an error.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "YM_LOG_LEVEL")]
    log_level: log::LevelFilter,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("ym-bridged v{}", env!("CARGO_PKG_VERSION"));

    let app_config =
        AppConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    if !app_config.core.oauth_token.is_empty() {
        log::info!("device_id={}", app_config.core.device_id);
    } else {
        log::warn!("no OAuth token configured (set YM_OAUTH_TOKEN or yandex.oauth_token) - starting in degraded mode");
    }

    let services = bootstrap_services(app_config.core).context("failed to bootstrap services")?;
    services.controller.start();
    log::info!("poll loop started");

    shutdown_signal().await;
    log::info!("shutdown signal received, cleaning up...");

    services.shutdown().await;
    log::info!("shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
