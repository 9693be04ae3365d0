use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, error, info, instrument};

use crate::auth::AuthUser;
use crate::dto::UploadResponse;
use crate::errors::ApiError;
use crate::models::Image;
use crate::repo;
use crate::storage::StorageError;
use crate::AppState;

/// Multipart field names accepted for the uploaded file
const FILE_FIELDS: [&str; 2] = ["file", "image"];

fn multipart_error(err: MultipartError, max_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StorageError::TooLarge { max_bytes }.into()
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Handler for uploading an image
///
/// This function handles POST requests to `/api/upload`. The first multipart
/// field named `file` or `image` is validated, written to the upload
/// directory and recorded for the caller. Other fields are ignored.
///
/// ### Returns
///
/// The new image id, its relative URL and the sanitized name
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.id()))]
pub async fn upload_image_handler(
    // Extract the application state
    State(state): State<AppState>,
    // Resolve the caller from the bearer token
    auth_user: AuthUser,
    // The multipart body, read field by field
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let max_bytes = state.store.max_upload_bytes();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, max_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if !FILE_FIELDS.contains(&name.as_str()) {
            debug!("Skipping multipart field {}", name);
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|err| multipart_error(err, max_bytes))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or(StorageError::NoFilename)?;
    let stored = state.store.save_upload(file_name.as_deref(), &bytes).await?;

    let image = Image::new(
        auth_user.id(),
        stored.filename.clone(),
        stored.original_name.clone(),
        stored.url.clone(),
        stored.content_type.clone(),
        stored.size_bytes,
    );

    let image = match repo::create_image(&state.pool, image).await {
        Ok(image) => image,
        Err(err) => {
            error!("Recording upload failed, removing {}", stored.filename);
            state.store.remove_upload(&stored.filename).await;
            return Err(ApiError::Database(err));
        }
    };

    info!("Uploaded image {} ({} bytes)", image.get_id(), image.get_size_bytes());

    Ok(Json(UploadResponse {
        image_id: image.get_id(),
        url: image.get_original_url(),
        name: image.get_original_name(),
    }))
}
