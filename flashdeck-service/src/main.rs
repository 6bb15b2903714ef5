use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

mod api;
mod config;
mod error;
mod generation;
mod ingestion;
mod models;
mod openai;
mod service;

#[cfg(test)]
mod testing;

use crate::config::AppConfig;
use crate::service::FlashdeckService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging();

    info!("Starting Flashdeck service v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        max_content_chars = config.ingestion.max_content_chars,
        "Configuration loaded"
    );

    if config.openai.api_key.is_none() {
        warn!("No OpenAI API key configured; generation requests will fail until one is set");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Initialize the service
    let service = Arc::new(FlashdeckService::new(config)?);

    // Build the router
    let app = api::router(service);

    // Start the server
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format()
        .with_target(true)
        .with_thread_ids(true)
        .compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("flashdeck_service=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format))
        .with(filter)
        .init();
}
