use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Main service error type
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors raised while turning documents into page text.
///
/// Only `Cancelled` and the upload validation variants ever reach an API
/// caller directly; parse, rasterization and vision failures are absorbed
/// into placeholder content by the ingestion pipeline.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Failed to extract text from document: {message}")]
    DocumentParse { message: String },

    #[error("Failed to render page {page}: {message}")]
    Rasterization { page: u32, message: String },

    #[error("Vision extraction failed for page {page}: {message}")]
    VisionExtraction { page: u32, message: String },

    #[error("Processing cancelled for document {document_id}")]
    Cancelled { document_id: String },

    #[error("Unsupported file format: {format}")]
    UnsupportedFormat { format: String },

    #[error("File too large: {size} bytes (max {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Empty file: {filename}")]
    EmptyFile { filename: String },

    #[error("IO error")]
    Io(#[source] std::io::Error),
}

/// Errors from a single flashcard generation call. None of these are
/// recovered: the caller either gets the full validated card list or one of
/// these.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{message}")]
    Configuration { message: String },

    #[error(
        "OpenAI API authentication failed. Your API key may be invalid or revoked. \
         Please verify your key at: https://platform.openai.com/api-keys"
    )]
    Authentication {
        #[source]
        source: ProviderError,
    },

    #[error(
        "OpenAI API quota exceeded. Please check your billing and usage at: \
         https://platform.openai.com/account/usage"
    )]
    QuotaExceeded {
        #[source]
        source: ProviderError,
    },

    #[error("Failed to parse AI response: {detail}")]
    MalformedResponse { detail: String },

    #[error("Invalid generation request: {message}")]
    InvalidRequest { message: String },

    #[error("AI generation failed: {0}")]
    Provider(ProviderError),
}

/// Chat completion provider errors, before classification.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Connection failed to {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request failed (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        kind: Option<String>,
        message: String,
    },

    #[error("Invalid response from provider: {message}")]
    InvalidResponse { message: String },

    #[error("Provider returned no completion")]
    EmptyCompletion,
}

/// API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Processing(ProcessingError::UnsupportedFormat { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServiceError::Processing(ProcessingError::FileTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ServiceError::Processing(
                ProcessingError::EmptyFile { .. } | ProcessingError::DocumentParse { .. },
            ) => StatusCode::BAD_REQUEST,
            ServiceError::Processing(ProcessingError::Cancelled { .. }) => StatusCode::CONFLICT,
            ServiceError::Generation(GenerationError::InvalidRequest { .. }) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Generation(GenerationError::QuotaExceeded { .. }) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ServiceError::Generation(
                GenerationError::Authentication { .. }
                | GenerationError::MalformedResponse { .. }
                | GenerationError::Provider(_),
            ) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Processing(ProcessingError::DocumentParse { .. }) => {
                "document_parse_error"
            }
            ServiceError::Processing(ProcessingError::Rasterization { .. }) => {
                "rasterization_error"
            }
            ServiceError::Processing(ProcessingError::VisionExtraction { .. }) => {
                "vision_extraction_error"
            }
            ServiceError::Processing(ProcessingError::Cancelled { .. }) => "cancelled",
            ServiceError::Processing(ProcessingError::UnsupportedFormat { .. }) => {
                "unsupported_format"
            }
            ServiceError::Processing(ProcessingError::FileTooLarge { .. }) => "file_too_large",
            ServiceError::Processing(ProcessingError::EmptyFile { .. }) => "empty_file",
            ServiceError::Processing(ProcessingError::Io(_)) => "io_error",
            ServiceError::Generation(GenerationError::Configuration { .. }) => {
                "configuration_error"
            }
            ServiceError::Generation(GenerationError::Authentication { .. }) => {
                "authentication_error"
            }
            ServiceError::Generation(GenerationError::QuotaExceeded { .. }) => "quota_exceeded",
            ServiceError::Generation(GenerationError::MalformedResponse { .. }) => {
                "malformed_response"
            }
            ServiceError::Generation(GenerationError::InvalidRequest { .. }) => "invalid_request",
            ServiceError::Generation(GenerationError::Provider(_)) => "generation_failed",
            ServiceError::InvalidRequest { .. } => "invalid_request",
            ServiceError::Config { .. } => "config_error",
            ServiceError::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();

        if status.is_server_error() {
            tracing::error!(code = %code, error = %format_error_chain(&self), "Request failed");
        }

        let response = ErrorResponse {
            message: self.to_string(),
            code: Some(code),
        };

        (status, Json(response)).into_response()
    }
}

/// Render an error and all of its sources as a single `a: b: c` line.
pub fn format_error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_errors_have_distinct_codes() {
        let config = ServiceError::from(GenerationError::Configuration {
            message: "missing key".to_string(),
        });
        let auth = ServiceError::from(GenerationError::Authentication {
            source: ProviderError::EmptyCompletion,
        });
        let quota = ServiceError::from(GenerationError::QuotaExceeded {
            source: ProviderError::EmptyCompletion,
        });
        let malformed = ServiceError::from(GenerationError::MalformedResponse {
            detail: "not an array".to_string(),
        });

        assert_eq!(config.error_code(), "configuration_error");
        assert_eq!(auth.error_code(), "authentication_error");
        assert_eq!(quota.error_code(), "quota_exceeded");
        assert_eq!(malformed.error_code(), "malformed_response");

        assert_eq!(config.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(quota.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(malformed.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_upload_errors_map_to_client_statuses() {
        let too_large = ServiceError::from(ProcessingError::FileTooLarge { size: 10, max: 5 });
        let wrong_type = ServiceError::from(ProcessingError::UnsupportedFormat {
            format: "docx".to_string(),
        });

        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(wrong_type.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_cancelled_is_a_client_status() {
        let cancelled = ServiceError::from(ProcessingError::Cancelled {
            document_id: "doc-1".to_string(),
        });

        assert_eq!(cancelled.status_code(), StatusCode::CONFLICT);
        assert!(!cancelled.status_code().is_server_error());
        assert_eq!(cancelled.error_code(), "cancelled");
    }

    #[test]
    fn test_format_error_chain_includes_sources() {
        let error = GenerationError::Provider(ProviderError::Api {
            status: 500,
            code: None,
            kind: None,
            message: "upstream exploded".to_string(),
        });

        let quota = GenerationError::QuotaExceeded {
            source: ProviderError::EmptyCompletion,
        };

        assert_eq!(
            format_error_chain(&error),
            "AI generation failed: Request failed (status 500): upstream exploded"
        );
        assert!(format_error_chain(&quota).ends_with(": Provider returned no completion"));
    }
}
