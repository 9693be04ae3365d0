use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json
};
use thiserror::Error;
use tracing::error;

use crate::editor::EditorError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Image processing failed: {0}")]
    Processing(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                error!("Database error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::Processing(msg) => {
                error!("Image processing failed: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NoFilename => ApiError::BadRequest("No file selected".to_string()),
            StorageError::InvalidExtension => ApiError::BadRequest(format!(
                "Invalid file type. Allowed types: {}",
                crate::storage::ALLOWED_EXTENSIONS.join(", ").to_uppercase()
            )),
            StorageError::TooLarge { max_bytes } => ApiError::PayloadTooLarge(format!(
                "File too large. Maximum size is {}MB.",
                max_bytes / (1024 * 1024)
            )),
            StorageError::InvalidImage => ApiError::BadRequest("Invalid image file".to_string()),
            StorageError::Missing(_) => ApiError::NotFound("File not found".to_string()),
            StorageError::Io(err) => ApiError::Internal(format!("File storage failed: {}", err)),
        }
    }
}

impl From<EditorError> for ApiError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::UnsupportedEditType(name) => {
                ApiError::BadRequest(format!("Unsupported edit_type: {}", name))
            }
            EditorError::InvalidIntensity(value) => {
                ApiError::BadRequest(format!("Intensity must be between 0 and 100, got {}", value))
            }
            EditorError::Decode(err) => ApiError::BadRequest(format!("Invalid image file: {}", err)),
            other => ApiError::Processing(other.to_string()),
        }
    }
}

/// Fallback for unknown routes
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

#[cfg(test)]
mod tests;
