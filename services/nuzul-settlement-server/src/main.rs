//! Nuzul Settlement Server
//!
//! REST API server for hotel commission and payout settlement.
//!
//! # Features
//!
//! - Payout listings and overview aggregates
//! - Commission charge batches against on-file payment methods
//! - Manual settlement-flag overrides with an audit trail
//! - Auto-reconciliation netting
//! - OpenAPI documentation with Swagger UI
//! - Prometheus metrics export
//! - Graceful shutdown handling
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings
//! nuzul-settlement-server
//!
//! # Start with custom config
//! nuzul-settlement-server --config /path/to/config.toml
//!
//! # Start with environment overrides
//! NUZUL__SERVER__PORT=9000 nuzul-settlement-server
//! ```

mod config;
mod seed;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nuzul_api::{create_router, ApiConfig, AppState};
use nuzul_ledger::ReservationLedger;
use nuzul_settlement::{FixedRateConverter, MockPaymentProcessor, SettlementEngine};

use crate::config::ServerConfig;

/// Nuzul Settlement Server - commission and payout settlement API
#[derive(Parser, Debug)]
#[command(name = "nuzul-settlement-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "NUZUL_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "NUZUL_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "NUZUL_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "NUZUL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json, pretty)
    #[arg(long, env = "NUZUL_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    /// Seed demo reservations, admins, and a payment method at startup
    #[arg(long, env = "NUZUL_SEED_DEMO_DATA")]
    seed_demo_data: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    if args.seed_demo_data {
        server_config.settlement.seed_demo_data = true;
    }
    server_config.logging.level = args.log_level;
    server_config.logging.format = args.log_format;

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Nuzul Settlement Server"
    );

    // Build the settlement engine. The in-memory processor and fixed-rate
    // converter stand in for the real integrations, which are wired here
    // once available.
    let ledger = Arc::new(ReservationLedger::new());
    let engine = Arc::new(SettlementEngine::new(
        ledger,
        Arc::new(MockPaymentProcessor::new()),
        Arc::new(FixedRateConverter::new(
            server_config.settlement.sar_to_usd_rate,
        )),
    ));
    let state = Arc::new(AppState::new(engine));

    if server_config.settlement.seed_demo_data {
        seed::seed_demo_data(&state).await?;
    }

    let api_config = ApiConfig {
        enable_cors: server_config.api.enable_cors,
        cors_origins: server_config.api.cors_origins.clone(),
        enable_tracing: server_config.api.enable_tracing,
    };
    let app = create_router(state, api_config);

    if server_config.metrics.enabled {
        start_metrics_server(server_config.metrics.port)?;
    }

    let addr = server_config.server.socket_addr()?;
    tracing::info!(
        host = %server_config.server.host,
        port = %server_config.server.port,
        "Server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);
    match config.format.as_str() {
        "json" => {
            subscriber.with(fmt::layer().json().with_target(true)).init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }
    Ok(())
}

/// Start the Prometheus metrics exporter
fn start_metrics_server(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(port = port, "Starting metrics server");

    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let handle = builder.with_http_listener(addr).install_recorder()?;

    metrics::describe_gauge!("nuzul_settlement_up", "1 while the server is running");
    metrics::gauge!("nuzul_settlement_up").set(1.0);

    tokio::spawn(async move {
        let _handle = handle;
        std::future::pending::<()>().await;
    });
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    tracing::info!(
        timeout_secs = timeout.as_secs(),
        "Waiting for in-flight requests to complete..."
    );
    tokio::time::sleep(timeout).await;
}
