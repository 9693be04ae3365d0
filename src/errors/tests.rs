use super::*;
use axum::body::to_bytes;
use axum::response::IntoResponse;

/// Helper to extract status code and body JSON from an ApiError response
async fn error_response(error: ApiError) -> (StatusCode, serde_json::Value) {
    let response = error.into_response();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

#[tokio::test]
async fn test_database_error_response_hides_details() {
    let error = ApiError::Database(anyhow::anyhow!("connection refused"));
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_not_found_response() {
    let error = ApiError::NotFound("Image not found".to_string());
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Image not found");
}

#[tokio::test]
async fn test_unauthorized_response() {
    let error = ApiError::Unauthorized("Invalid token".to_string());
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_processing_response_is_bad_gateway() {
    let error = ApiError::Processing("upstream returned 500".to_string());
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream returned 500");
}

#[tokio::test]
async fn test_storage_errors_map_to_client_messages() {
    let (status, body) = error_response(StorageError::NoFilename.into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file selected");

    let (status, body) = error_response(StorageError::InvalidExtension.into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid file type. Allowed types: PNG, JPG, JPEG, WEBP");

    let too_large = StorageError::TooLarge { max_bytes: 5 * 1024 * 1024 };
    let (status, body) = error_response(too_large.into()).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "File too large. Maximum size is 5MB.");

    let (status, body) = error_response(StorageError::Missing("a.png".to_string()).into()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "File not found");
}

#[tokio::test]
async fn test_editor_errors_map_to_status() {
    let unsupported = EditorError::UnsupportedEditType("sepia".to_string());
    let (status, body) = error_response(unsupported.into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported edit_type: sepia");

    let upstream = EditorError::Upstream("status 500".to_string());
    let (status, _) = error_response(upstream.into()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_route_not_found() {
    let (status, body) = error_response(route_not_found().await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}
