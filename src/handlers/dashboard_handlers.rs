use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info, instrument};

use crate::auth::AuthUser;
use crate::dto::{ImageSummary, StatsResponse, StatusResponse};
use crate::errors::ApiError;
use crate::models::Image;
use crate::repo;
use crate::storage::content_type_for;
use crate::AppState;

fn image_not_found() -> ApiError {
    ApiError::NotFound("Image not found".to_string())
}

/// Looks up an image owned by the caller
fn owned_image(state: &AppState, image_id: &str, user_id: &str) -> Result<Option<Image>, ApiError> {
    repo::get_image_for_user(&state.pool, image_id, user_id).map_err(ApiError::Database)
}

/// Builds gallery entries for a user's images, newest first
fn summaries_for(state: &AppState, user_id: &str) -> Result<Vec<ImageSummary>, ApiError> {
    let images = repo::list_images_for_user(&state.pool, user_id).map_err(ApiError::Database)?;
    let ids: Vec<String> = images.iter().map(Image::get_id).collect();
    let latest = repo::latest_edits_for_images(&state.pool, &ids).map_err(ApiError::Database)?;

    Ok(images
        .iter()
        .map(|image| ImageSummary::new(image, latest.get(&image.get_id()), &state.config.public_base_url))
        .collect())
}

fn attachment(bytes: Vec<u8>, content_type: &str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        Bytes::from(bytes),
    )
        .into_response()
}

/// Handler for listing the caller's images
///
/// This function handles GET requests to `/api/images`.
///
/// ### Returns
///
/// Gallery entries with absolute URLs; edited fields come from the most
/// recent edit of each image
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn list_images_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<ImageSummary>>, ApiError> {
    let summaries = summaries_for(&state, &auth_user.id())?;
    debug!("Listing {} images", summaries.len());
    Ok(Json(summaries))
}

/// Handler for `GET /api/user-images/{user_id}`
///
/// Same listing as [`list_images_handler`], addressed by user id. Only the
/// caller's own id is allowed.
#[instrument(skip(state, auth_user), fields(caller = %auth_user.id()))]
pub async fn list_user_images_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ImageSummary>>, ApiError> {
    if user_id != auth_user.id() {
        return Err(ApiError::Forbidden("Not allowed to view another user's images".to_string()));
    }
    Ok(Json(summaries_for(&state, &user_id)?))
}

#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn get_image_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(image_id): Path<String>,
) -> Result<Json<ImageSummary>, ApiError> {
    let image = owned_image(&state, &image_id, &auth_user.id())?.ok_or_else(image_not_found)?;
    let latest = repo::latest_edit_for_image(&state.pool, &image_id).map_err(ApiError::Database)?;

    Ok(Json(ImageSummary::new(&image, latest.as_ref(), &state.config.public_base_url)))
}

/// Handler for deleting an image
///
/// This function handles DELETE requests to `/api/images/{id}`. The image
/// and all its edits are removed from the database first; the files are
/// removed afterwards on a best-effort basis.
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn delete_image_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(image_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let image = owned_image(&state, &image_id, &auth_user.id())?.ok_or_else(image_not_found)?;
    let edits = repo::list_edits_for_image(&state.pool, &image_id).map_err(ApiError::Database)?;

    if !repo::delete_image(&state.pool, &image_id).await.map_err(ApiError::Database)? {
        return Err(image_not_found());
    }

    state.store.remove_upload(&image.get_filename()).await;
    for edit in &edits {
        state.store.remove_processed(&edit.get_stored_filename()).await;
    }

    info!("Deleted image {} and {} edits", image_id, edits.len());

    Ok(Json(StatusResponse::new("deleted")))
}

/// Handler for `GET /api/images/{id}/download`: the latest edit as an attachment
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn download_edited_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(image_id): Path<String>,
) -> Result<Response, ApiError> {
    let edited_not_found = || ApiError::NotFound("Edited image not found".to_string());

    owned_image(&state, &image_id, &auth_user.id())?.ok_or_else(edited_not_found)?;
    let edit = repo::latest_edit_for_image(&state.pool, &image_id)
        .map_err(ApiError::Database)?
        .ok_or_else(edited_not_found)?;

    let filename = edit.get_stored_filename();
    let bytes = state.store.read_processed(&filename).await?;

    Ok(attachment(bytes, content_type_for(&filename), &filename))
}

/// Handler for `GET /api/images/{id}/original`: the upload as an attachment
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn download_original_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(image_id): Path<String>,
) -> Result<Response, ApiError> {
    let image = owned_image(&state, &image_id, &auth_user.id())?
        .ok_or_else(|| ApiError::NotFound("Original image not found".to_string()))?;

    let bytes = state.store.read_upload(&image.get_filename()).await?;

    Ok(attachment(bytes, &image.get_content_type(), &image.get_filename()))
}

/// Handler for `GET /api/user/stats`
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn user_stats_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = repo::user_stats(&state.pool, &auth_user.id()).map_err(ApiError::Database)?;
    Ok(Json(StatsResponse::from(stats)))
}
