// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nightscout Connector API Server
//!
//! Stores per-user Nightscout connections and proxies glucose entry reads.

use nightscout_connector::{config::Config, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        auth_mode = ?config.auth_mode,
        store = ?config.store_backend,
        "Starting Nightscout Connector API"
    );

    // Store, verifier and HTTP clients are created once here; failures abort startup.
    let state = Arc::new(AppState::from_config(config.clone()).await?);

    let app = nightscout_connector::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nightscout_connector=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
