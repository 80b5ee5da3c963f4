//! Heartbeat: a minimal HTTP liveness service.
//!
//! This is the application entry point. It initializes tracing, builds the
//! router and runs the HTTP server until the listener fails, at which point
//! the process exits with a non-zero status.

use std::process::ExitCode;

use axum_server::Handle;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use heartbeat::config::{
    Timeouts, DEFAULT_LOG_FILTER, HEALTH_URL, HTTP_BIND_ADDR, HTTP_PORT,
};
use heartbeat::create_router;
use heartbeat::http::start_server;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Heartbeat: a minimal HTTP liveness service
#[derive(Parser, Debug)]
#[command(name = "heartbeat", version, about)]
struct Args {
    /// Log level filter (e.g., "heartbeat=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let json = args.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&log_filter))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(port = HTTP_PORT, "Starting server on port {}...", HTTP_PORT);
    tracing::info!(url = HEALTH_URL, "Health endpoint available at: {}", HEALTH_URL);

    let timeouts = Timeouts::default();
    let app = create_router(timeouts.write);

    match start_server(app, HTTP_BIND_ADDR, timeouts, Handle::new()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed to start");
            ExitCode::FAILURE
        }
    }
}
