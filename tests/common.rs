//! Common test utilities for SmartPix integration tests
//!
//! This file contains shared functions and utilities for all integration tests,
//! including test application setup, helpers for signing up users and
//! uploading images, and request builders for the body formats the API takes.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use smartpix::{config::base_config, config::Config, create_app, db::init_pool, editor::LocalEditor, AppState};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A running test application and the directory its files live in
///
/// The directory is removed when this is dropped, so keep it alive for the
/// whole test.
pub struct TestApp {
    pub router: Router,
    pub dir: TempDir,
}

impl TestApp {
    /// Sends a request through a clone of the router
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Creates a test application with an in-memory SQLite database
///
/// This helper function:
/// 1. Creates a unique shared in-memory SQLite database
/// 2. Runs migrations to set up the schema
/// 3. Points the file store at a temporary directory
/// 4. Creates an Axum application with the local image editor
pub fn create_test_app() -> TestApp {
    create_test_app_with(|_| {})
}

/// Same as [`create_test_app`], letting the caller adjust the configuration
pub fn create_test_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let dir = TempDir::new().unwrap();

    // Plain ":memory:" would give every pooled connection its own database
    let database_url = format!("file:it_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = Arc::new(init_pool(&database_url).unwrap());
    let conn = &mut pool.get().unwrap();
    smartpix::run_migrations(conn).unwrap();

    let mut config = base_config(None);
    config.static_dir = dir.path().to_path_buf();
    config.jwt_secret = Some("integration-secret".to_string());
    config.public_base_url = "http://testserver".to_string();
    adjust(&mut config);

    let state = AppState::new(pool, config, Arc::new(LocalEditor::new())).unwrap();

    TestApp {
        router: create_app(state),
        dir,
    }
}

/// Encodes a small gradient image
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 90])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    image_bytes(width, height, ImageFormat::Png)
}

/// Reads a response body as JSON
pub async fn body_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

/// Builds a JSON request, optionally with a bearer token
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(serde_json::to_vec(&body).unwrap())).unwrap()
}

/// Builds a url-encoded form request, optionally with a bearer token
pub fn form_request<T: serde::Serialize>(uri: &str, token: Option<&str>, form: &T) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_html_form::to_string(form).unwrap()))
        .unwrap()
}

/// Builds a bodiless request with a bearer token
pub fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Builds a multipart upload with a single file field
pub fn upload_request(token: Option<&str>, field: &str, filename: Option<&str>, bytes: &[u8]) -> Request<Body> {
    let boundary = "smartpix-test-boundary";
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("Content-Type", format!("multipart/form-data; boundary={}", boundary));
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

/// Signs up a user via the API and returns `(user_id, token)`
pub async fn signup(app: &TestApp, email: &str) -> (String, String) {
    let response = app
        .send(json_request(
            "POST",
            "/api/signup",
            None,
            json!({"email": email, "password": "correct horse"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    (
        body["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// Uploads a PNG for the user and returns the image id
pub async fn upload_png(app: &TestApp, token: &str, filename: &str) -> String {
    let response = app
        .send(upload_request(Some(token), "file", Some(filename), &png_bytes(24, 16)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["image_id"].as_str().unwrap().to_string()
}

/// Applies an edit through the JSON endpoint and returns the response body
pub async fn process(app: &TestApp, token: &str, image_id: &str, edit_type: &str, intensity: i64) -> Value {
    let response = app
        .send(json_request(
            "POST",
            &format!("/api/images/{}/process", image_id),
            Some(token),
            json!({"editType": edit_type, "intensity": intensity}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}
