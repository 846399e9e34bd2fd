// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Gavel Node
//!
//! Entry point for the `gavel-node` binary. Parses CLI arguments, initializes
//! logging and metrics, drives the auction clock, and serves the HTTP/WS API.
//!
//! - `run`: start the node
//! - `version`: print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use gavel_engine::{AuctionConfig, ManualClock};

use cli::{Commands, GavelNodeCli};
use metrics::NodeMetrics;

/// Broadcast channel capacity for live event streaming. Slow WebSocket
/// clients that fall further behind skip ahead and can backfill from
/// `GET /events`.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = GavelNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Reads the auction rules from a JSON file. Fields that are absent keep
/// their defaults.
fn load_config(path: &Path) -> Result<AuctionConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: AuctionConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Resolves the effective config from the optional file and CLI overrides.
fn resolve_config(args: &cli::RunArgs) -> Result<AuctionConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AuctionConfig::default(),
    };
    if let Some(custody) = &args.custody {
        config.custody = custody.clone();
    }
    config.validate().context("invalid auction config")?;
    Ok(config)
}

/// Advances the clock by one unit every `block_time` and mirrors the height
/// into the `block_height` gauge.
async fn run_block_ticker(clock: ManualClock, metrics: Arc<NodeMetrics>, block_time: Duration) {
    let mut interval = tokio::time::interval(block_time);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        let height = clock.advance(1);
        metrics
            .block_height
            .set(i64::try_from(height).unwrap_or(i64::MAX));
        tracing::trace!(height, "tick");
    }
}

/// Starts the node: API server, metrics endpoint, and block ticker.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(&args.log_level, args.log_format.into());

    let config = resolve_config(&args)?;
    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        block_time_ms = args.block_time_ms,
        custody = %config.custody,
        min_duration = config.min_duration,
        snipe_window = config.snipe_window,
        snipe_extension = config.snipe_extension,
        "starting gavel-node"
    );

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);

    // --- Application state ---
    let app_state = api::AppState::new(
        config,
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&node_metrics),
        EVENT_CHANNEL_CAPACITY,
    )
    .context("failed to build auction house")?;

    // --- API server ---
    let api_router = api::create_router(app_state.clone());
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!(addr = %api_addr, "API server listening");

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!(addr = %metrics_addr, "metrics server listening");

    // --- Block ticker ---
    let ticker = tokio::spawn(run_block_ticker(
        app_state.clock.clone(),
        Arc::clone(&node_metrics),
        Duration::from_millis(args.block_time_ms.max(1)),
    ));

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "API server error");
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "metrics server error");
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    ticker.abort();
    tracing::info!(
        height = app_state.house.now(),
        auctions = app_state.house.auction_count(),
        "gavel-node stopped"
    );
    Ok(())
}

fn print_version() {
    println!("gavel-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc      {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed the corresponding branch never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
}
