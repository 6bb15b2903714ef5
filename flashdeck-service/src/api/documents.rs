//! Document API endpoints.

use axum::{
    Json,
    extract::{Multipart, State},
};
use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::DocumentMetadata;
use crate::service::UploadedFile;

use super::AppState;

/// Page count and size of an uploaded PDF
pub async fn document_metadata_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<DocumentMetadata>, ServiceError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::InvalidRequest {
            message: e.to_string(),
        })?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("document").to_string();
            let data = field.bytes().await.map_err(|e| ServiceError::InvalidRequest {
                message: e.to_string(),
            })?;
            file = Some(UploadedFile {
                filename,
                data: data.to_vec(),
            });
        }
    }

    let file = file.ok_or_else(|| ServiceError::InvalidRequest {
        message: "No file provided".to_string(),
    })?;

    let service = state.service.clone();
    let metadata = tokio::task::spawn_blocking(move || service.document_metadata(&file))
        .await
        .map_err(|e| ServiceError::Internal {
            message: format!("Metadata task failed: {}", e),
        })??;

    Ok(Json(metadata))
}
