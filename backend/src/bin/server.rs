//! PV dashboard HTTP server binary.
//!
//! Loads configuration, optionally preloads a baseline dataset, sets up the
//! HTTP router and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin pvdash-server
//!
//! # With a config file and a baseline dataset
//! PVDASH_CONFIG=./pvdash.toml PVDASH_BASELINE=./baseline.json cargo run --bin pvdash-server
//! ```
//!
//! # Environment Variables
//!
//! - `PVDASH_CONFIG`: Path to a TOML config file (otherwise `pvdash.toml` is searched)
//! - `PVDASH_BASELINE`: JSON file holding an array of raw rows for the chart endpoints
//! - `HOST`, `PORT`: Listener address (default: 0.0.0.0:8080)
//! - `PVDASH_COMBINATION_LIMIT`: Exhaustive pixel-subset search cap
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pvdash::config::AppConfig;
use pvdash::http::{create_router, AppState};
use pvdash::models::RawRow;
use pvdash::services::BaselineSnapshot;

fn load_baseline(path: &str) -> anyhow::Result<BaselineSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read baseline file {}", path))?;
    let rows: Vec<RawRow> = serde_json::from_str(&text)
        .with_context(|| format!("baseline file {} is not a JSON array of rows", path))?;
    Ok(BaselineSnapshot::from_raw(&rows))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting PV dashboard server");

    let config = AppConfig::load()?;
    info!(
        "Configuration loaded (combination limit {}, yield percentile {}, window {} days)",
        config.analysis.combination_limit,
        config.analysis.yield_percentile,
        config.analysis.repeatability_window_days
    );

    let addr: SocketAddr = config.bind_address().parse()?;
    let state = AppState::new(config);

    if let Ok(path) = env::var("PVDASH_BASELINE") {
        let snapshot = load_baseline(&path)?;
        for rejection in &snapshot.rejections {
            tracing::warn!("{}", rejection);
        }
        state.baseline.replace(snapshot);
    }

    // Create router with all endpoints
    let app = create_router(state);

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
