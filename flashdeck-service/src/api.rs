//! HTTP API for the Flashdeck service.
//!
//! This module provides the REST API endpoints for:
//! - Health monitoring
//! - Flashcard generation from a topic or uploaded documents
//! - Cancelling an in-flight document generation
//! - Document metadata lookup

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::FlashdeckService;

pub mod documents;
pub mod flashcards;
use documents::document_metadata_handler;
use flashcards::{
    cancel_generation_handler, generate_from_documents_handler, generate_from_topic_handler,
};

/// Room for the non-file multipart fields and boundaries.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Application state
pub struct AppState {
    pub service: Arc<FlashdeckService>,
    pub start_time: Instant,
}

/// Build the API router
pub fn router(service: Arc<FlashdeckService>) -> Router {
    let limits = service.config.limits.clone();

    let state = Arc::new(AppState {
        service,
        start_time: Instant::now(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_document_size = limits.max_document_size_bytes as usize;
    let single_upload_limit = max_document_size.saturating_add(MULTIPART_OVERHEAD_BYTES);
    let batch_upload_limit = max_document_size
        .saturating_mul(limits.max_documents_per_request)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let api_routes = Router::new()
        // Flashcard endpoints
        .route("/flashcards/generate", post(generate_from_topic_handler))
        .route(
            "/flashcards/generate-from-documents",
            post(generate_from_documents_handler).layer(DefaultBodyLimit::max(batch_upload_limit)),
        )
        .route(
            "/generations/{request_id}/cancel",
            post(cancel_generation_handler),
        )
        // Document endpoints
        .route(
            "/documents/metadata",
            post(document_metadata_handler).layer(DefaultBodyLimit::max(single_upload_limit)),
        );

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Health ===

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let openai_configured = state
        .service
        .config
        .openai
        .api_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty());

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        openai_configured,
        active_generations: state.service.active_generations(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    openai_configured: bool,
    active_generations: usize,
}
