// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon binary: loads configuration, wires the engine components
//! against a shared store, and serves the HTTP API while the worker
//! dispatcher, scheduler, and notification router run in the background.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod error;
mod executor;
mod routes;
mod state;

#[cfg(test)]
mod test_harness;

use clap::Parser;
use config::DaemonConfig;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line overrides layered on top of `crawld.toml` and `CRAWLD__` env vars.
#[derive(Parser)]
#[command(name = "crawld", about = "Job management subsystem daemon")]
struct Cli {
    /// Override the configured bind address (e.g. 0.0.0.0:9090).
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,crawl_engine=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = DaemonConfig::load()?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    tracing::info!(bind_addr = %config.bind_addr, "configuration loaded");

    let (app_state, background) = state::build(&config);
    let shutdown = CancellationToken::new();
    let background_handles = background.spawn(shutdown.clone());

    let router = routes::build_router(app_state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str()).await?;
    tracing::info!(bind_addr = %config.bind_addr, "listening");

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown_signal(shutdown.clone())).await?;

    shutdown.cancel();
    for handle in background_handles {
        let _ = handle.await;
    }

    Ok(())
}

async fn wait_for_shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received, draining background tasks");
    shutdown.cancel();
    tokio::time::sleep(Duration::from_millis(100)).await;
}
