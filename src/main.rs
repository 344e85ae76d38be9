// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use esa_webhook::constants::{DEFAULT_LISTEN_ADDR, GROUP_NAME_ENV, LISTEN_ADDR_ENV};
use esa_webhook::solver::EsaSolver;
use esa_webhook::webhook::{build_router, serve, SolverRegistry, WebhookState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// cert-manager DNS-01 webhook for Alibaba Cloud ESA
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// API group the solver is registered under with cert-manager
    #[arg(long, env = GROUP_NAME_ENV, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    group_name: String,

    /// Address the webhook listens on
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    listen_addr: SocketAddr,
}

fn main() -> Result<()> {
    // Missing or empty GROUP_NAME is fatal: clap prints the error and exits non-zero
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("esa-webhook")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

/// Initialize logging.
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT` (`text` or `json`).
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(args: Args) -> Result<()> {
    init_tracing();

    info!(
        group_name = %args.group_name,
        listen_addr = %args.listen_addr,
        "Starting ESA DNS-01 webhook"
    );

    debug!("Inferring Kubernetes client configuration");
    let kube_config = kube::Config::infer()
        .await
        .context("failed to infer Kubernetes configuration")?;

    let mut registry = SolverRegistry::new();
    registry.register(Arc::new(EsaSolver::new()))?;

    let (stop_tx, stop_rx) = watch::channel(false);
    registry.initialize_all(&kube_config, &stop_rx).await?;

    let listener = TcpListener::bind(args.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.listen_addr))?;
    let router = build_router(Arc::new(WebhookState::new(args.group_name, registry)));

    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(signal) => info!("Received {signal}, initiating graceful shutdown"),
            Err(e) => error!(error = %e, "Failed to listen for shutdown signals, stopping"),
        }
        let _ = stop_tx.send(true);
    });

    serve(listener, router, stop_rx).await?;

    info!("Graceful shutdown completed");
    Ok(())
}

/// Wait for SIGTERM (pod termination) or SIGINT (Ctrl+C).
async fn shutdown_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                Ok("SIGINT")
            }
            _ = sigterm.recv() => Ok("SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("Ctrl+C")
    }
}
