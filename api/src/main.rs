//! Order forms portal gateway binary

use std::sync::Arc;

use anyhow::Context;
use portal_api::{build_router, AppState, HttpDownstream, PortalConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PortalConfig::load().context("loading configuration")?;
    let downstream = HttpDownstream::new(&config).context("building HTTP client")?;
    let addr = config.server.bind_addr.clone();

    tracing::info!(mode = ?config.mode, orders = %config.backends.orders, "Configuration loaded");
    let app = build_router(AppState::new(config, Arc::new(downstream)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("Portal API listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
