//! Flashcard generation API endpoints.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::NewFlashcard;
use crate::service::{DocumentFlashcards, UploadedFile};

use super::AppState;

fn default_count() -> u32 {
    10
}

/// Request to generate flashcards about a topic
#[derive(Deserialize)]
pub struct GenerateFromTopicRequest {
    pub deck_id: i64,
    pub topic: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub include_hints: bool,
}

/// Response for cancel requests
#[derive(Serialize)]
pub struct CancelResponse {
    pub request_id: String,
    pub cancelled: bool,
}

/// Generate flashcards for a deck from a topic
pub async fn generate_from_topic_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateFromTopicRequest>,
) -> Result<Json<Vec<NewFlashcard>>, ServiceError> {
    let flashcards = state
        .service
        .generate_from_topic(
            request.deck_id,
            &request.topic,
            request.count,
            request.include_hints,
        )
        .await?;
    Ok(Json(flashcards))
}

fn invalid_field(name: &str, error: impl std::fmt::Display) -> ServiceError {
    ServiceError::InvalidRequest {
        message: format!("Invalid field '{}': {}", name, error),
    }
}

/// Generate flashcards for a deck from uploaded PDFs
pub async fn generate_from_documents_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<DocumentFlashcards>, ServiceError> {
    let mut files: Vec<UploadedFile> = Vec::new();
    let mut instructions: Option<String> = None;
    let mut count = default_count();
    let mut deck_id: Option<i64> = None;
    let mut request_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid_field("multipart", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("document").to_string();
                let data = field.bytes().await.map_err(|e| invalid_field("file", e))?;
                files.push(UploadedFile {
                    filename,
                    data: data.to_vec(),
                });
            }
            "instructions" => {
                instructions = Some(field.text().await.map_err(|e| invalid_field(&name, e))?);
            }
            "count" => {
                let text = field.text().await.map_err(|e| invalid_field(&name, e))?;
                count = text.trim().parse().map_err(|e| invalid_field(&name, e))?;
            }
            "deck_id" => {
                let text = field.text().await.map_err(|e| invalid_field(&name, e))?;
                deck_id = Some(text.trim().parse().map_err(|e| invalid_field(&name, e))?);
            }
            "request_id" => {
                let text = field.text().await.map_err(|e| invalid_field(&name, e))?;
                if !text.trim().is_empty() {
                    request_id = Some(text.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let deck_id = deck_id.ok_or_else(|| ServiceError::InvalidRequest {
        message: "Missing field 'deck_id'".to_string(),
    })?;

    let result = state
        .service
        .generate_from_documents(deck_id, &files, instructions.as_deref(), count, request_id)
        .await?;
    Ok(Json(result))
}

/// Cancel an in-flight document generation
pub async fn cancel_generation_handler(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Json<CancelResponse> {
    let cancelled = state.service.cancel_generation(&request_id);
    Json(CancelResponse {
        request_id,
        cancelled,
    })
}
