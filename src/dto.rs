/// Request and response bodies for the HTTP API
///
/// Field names follow what the web frontend already expects: snake_case for
/// the auth and edit endpoints, camelCase for the dashboard endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Edit, Image};
use crate::repo::UserStats;

/// Body of `POST /api/signup` and the JSON flavour of `POST /api/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2 password-flow form accepted by `POST /api/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordForm {
    /// The account email
    pub username: String,
    pub password: String,
}

/// Issued after signup or login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub email: String,
    pub id: String,
    pub token: String,
}

/// Profile of the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub image_id: String,
    /// Relative URL of the stored original
    pub url: String,
    /// Sanitized client-side filename
    pub name: String,
}

/// Form body of `POST /api/edit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditForm {
    pub image_id: String,
    pub edit_type: String,
    #[serde(default)]
    pub intensity: Option<i64>,
}

/// JSON body of `POST /api/images/{id}/process`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessImageDto {
    pub edit_type: String,
    #[serde(default)]
    pub intensity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResponse {
    /// Relative URL of the processed file
    pub edited_url: String,
    pub edit_id: String,
    pub edit_type: String,
    pub intensity: i32,
}

impl From<&Edit> for EditResponse {
    fn from(edit: &Edit) -> Self {
        Self {
            edited_url: edit.get_edited_url(),
            edit_id: edit.get_id(),
            edit_type: edit.get_edit_type(),
            intensity: edit.get_intensity(),
        }
    }
}

/// One entry of the dashboard gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub id: String,
    pub name: String,
    pub original_image_url: String,
    /// Latest edit, if the image has been edited
    pub edited_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edit_type: Option<String>,
}

impl ImageSummary {
    /// Builds a summary with URLs made absolute against `base_url`
    pub fn new(image: &Image, latest_edit: Option<&Edit>, base_url: &str) -> Self {
        Self {
            id: image.get_id(),
            name: image.get_original_name(),
            original_image_url: absolute_url(base_url, &image.get_original_url()),
            edited_image_url: latest_edit.map(|edit| absolute_url(base_url, &edit.get_edited_url())),
            created_at: image.get_uploaded_at(),
            edit_type: latest_edit.map(Edit::get_edit_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_images: i64,
    pub processed_images: i64,
    pub total_edits: i64,
    /// Megabytes, one decimal place
    pub storage_used: f64,
}

impl From<UserStats> for StatsResponse {
    fn from(stats: UserStats) -> Self {
        let megabytes = stats.storage_bytes as f64 / (1024.0 * 1024.0);
        Self {
            total_images: stats.total_images,
            processed_images: stats.processed_images,
            total_edits: stats.total_edits,
            storage_used: (megabytes * 10.0).round() / 10.0,
        }
    }
}

/// Generic `{"status": ...}` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}

/// Joins a public origin and a root-relative path without doubling slashes
pub fn absolute_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests;
