use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{Path, State};
use axum::{Form, Json};
use tracing::{error, info, instrument};

use crate::auth::AuthUser;
use crate::dto::{EditForm, EditResponse, ProcessImageDto};
use crate::editor::{self, DEFAULT_INTENSITY};
use crate::errors::ApiError;
use crate::models::Edit;
use crate::repo;
use crate::storage::processed_url;
use crate::AppState;

/// Validates the request, runs the editor and records the result
///
/// Edit type and intensity are checked before the image is looked up, so a
/// bad request is reported as 400 even for an unknown image id.
async fn run_edit(
    state: &AppState,
    user_id: &str,
    image_id: &str,
    edit_type: &str,
    intensity: Option<i64>,
) -> Result<Edit, ApiError> {
    let edit_type = editor::parse_edit_type(edit_type)?;
    let intensity = match intensity {
        Some(value) => editor::validate_intensity(value)?,
        None => DEFAULT_INTENSITY,
    };

    let image = repo::get_image_for_user(&state.pool, image_id, user_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Image not found".to_string()))?;

    let original = state.store.read_upload(&image.get_filename()).await?;
    let edited = state.editor.edit(&original, edit_type, intensity).await?;
    let filename = state.store.save_processed(&edited.bytes, edited.extension).await?;

    let edit = Edit::new(
        image.get_id(),
        user_id.to_string(),
        processed_url(&filename),
        edit_type,
        i32::from(intensity),
    );

    match repo::create_edit(&state.pool, edit).await {
        Ok(edit) => {
            info!(
                "Applied {} to image {} with {} ({}, {} bytes)",
                edit_type,
                image.get_id(),
                state.editor.name(),
                edited.content_type,
                edited.bytes.len()
            );
            Ok(edit)
        }
        Err(err) => {
            error!("Recording edit failed, removing {}", filename);
            state.store.remove_processed(&filename).await;
            Err(ApiError::Database(err))
        }
    }
}

/// Handler for `POST /api/edit`
///
/// Takes a form body `{image_id, edit_type, intensity}`. The image must
/// belong to the caller.
#[instrument(skip(state, auth_user, form), fields(user_id = %auth_user.id()))]
pub async fn edit_image_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
    form: Result<Form<EditForm>, FormRejection>,
) -> Result<Json<EditResponse>, ApiError> {
    let Form(form) = form.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let edit = run_edit(&state, &auth_user.id(), &form.image_id, &form.edit_type, form.intensity).await?;

    Ok(Json(EditResponse::from(&edit)))
}

/// Handler for `POST /api/images/{id}/process`
///
/// JSON flavour of [`edit_image_handler`]: `{editType, intensity?}` with the
/// image id in the path. Intensity defaults to 50.
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.id(), image_id = %image_id))]
pub async fn process_image_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(image_id): Path<String>,
    payload: Result<Json<ProcessImageDto>, JsonRejection>,
) -> Result<Json<EditResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let edit = run_edit(&state, &auth_user.id(), &image_id, &payload.edit_type, payload.intensity).await?;

    Ok(Json(EditResponse::from(&edit)))
}
