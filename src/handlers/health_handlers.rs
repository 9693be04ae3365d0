use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::dto::StatusResponse;
use crate::models::EditType;

/// One documented endpoint
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RouteDoc {
    pub method: &'static str,
    pub path: &'static str,
    pub auth: bool,
    pub description: &'static str,
}

const fn route(method: &'static str, path: &'static str, auth: bool, description: &'static str) -> RouteDoc {
    RouteDoc {
        method,
        path,
        auth,
        description,
    }
}

/// Every route the server exposes, as listed at `/docs`
pub const ROUTES: &[RouteDoc] = &[
    route("POST", "/api/signup", false, "Register with JSON {email, password}; returns {email, id, token}"),
    route("POST", "/api/login", false, "Log in with JSON {email, password} or the OAuth2 password form"),
    route("GET", "/api/me", true, "Profile of the authenticated user"),
    route("POST", "/api/upload", true, "Upload an image as multipart field `file` or `image`"),
    route("POST", "/api/edit", true, "Edit an image with form {image_id, edit_type, intensity}"),
    route("GET", "/api/images", true, "List your images, newest first"),
    route("GET", "/api/images/{id}", true, "One image with its latest edit"),
    route("DELETE", "/api/images/{id}", true, "Delete an image, its edits and files"),
    route("POST", "/api/images/{id}/process", true, "Edit an image with JSON {editType, intensity?}"),
    route("GET", "/api/images/{id}/download", true, "Download the latest edited file"),
    route("GET", "/api/images/{id}/original", true, "Download the original upload"),
    route("GET", "/api/user-images/{user_id}", true, "List images of the given user (must be you)"),
    route("GET", "/api/user/stats", true, "Image, edit and storage totals"),
    route("GET", "/static/{path}", false, "Stored uploads and processed images"),
    route("GET", "/healthz", false, "Liveness check"),
    route("GET", "/api/health", false, "Liveness check"),
    route("GET", "/docs", false, "This index"),
];

/// Liveness check for `/healthz` and `/api/health`
pub async fn health_handler() -> Json<StatusResponse> {
    Json(StatusResponse::new("ok"))
}

/// Route index served at `/docs`, with every edit type and its description
pub async fn docs_handler() -> Json<Value> {
    let edit_types: Vec<Value> = EditType::ALL
        .iter()
        .map(|edit_type| json!({"name": edit_type, "prompt": edit_type.prompt()}))
        .collect();

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "edit_types": edit_types,
        "routes": ROUTES,
    }))
}
