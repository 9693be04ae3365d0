/// SmartPix: an image editing backend
///
/// This library provides user accounts, image uploads, pluggable image
/// editing and a gallery dashboard behind a JSON web API.
///
/// ### Modules
///
/// - `auth`: Password hashing, JWT tokens and the authenticated-user extractor
/// - `config`: Layered configuration (defaults, TOML file, env and flags)
/// - `db`: Database connection management
/// - `dto`: Request and response bodies
/// - `editor`: Image editing backends
/// - `errors`: API error type and its HTTP mapping
/// - `handlers`: HTTP handlers
/// - `models`: Data structures for users, images and edits
/// - `repo`: Repository layer for database operations
/// - `schema`: Database schema definitions
/// - `storage`: On-disk file store for uploads and results
///
/// ### Web API
///
/// See [`create_app`] for the route table; the running server also lists it
/// at `GET /docs`.

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod editor;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repo;
pub mod schema;
pub mod storage;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::db::DbPool;
use crate::editor::ImageEditor;
use crate::errors::route_not_found;
use crate::handlers::*;
use crate::storage::{FileStore, StorageError};

/// Room left in the request body limit for multipart boundaries and headers
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub config: Arc<Config>,
    pub store: Arc<FileStore>,
    pub editor: Arc<dyn ImageEditor>,
    jwt_secret: Arc<str>,
}

impl AppState {
    /// Builds the state, creating the storage directories
    ///
    /// Without a configured JWT secret a random one is generated, so tokens
    /// only stay valid for the lifetime of the process.
    pub fn new(pool: Arc<DbPool>, config: Config, editor: Arc<dyn ImageEditor>) -> Result<Self, StorageError> {
        let store = FileStore::from_config(&config)?;
        let jwt_secret = config
            .jwt_secret
            .clone()
            .filter(|secret| !secret.is_empty())
            .unwrap_or_else(auth::generate_secret);

        Ok(Self {
            pool,
            config: Arc::new(config),
            store: Arc::new(store),
            editor,
            jwt_secret: jwt_secret.into(),
        })
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }
}

/// Builds the CORS layer from the configured origin allow-list
///
/// A `*` entry allows any origin by echoing the request's `Origin` back, as
/// a literal wildcard cannot be combined with credentials. Origins that are
/// not valid header values are skipped with a warning.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        warn!("ALLOWED_ORIGINS contains '*'; any origin may make credentialed requests");
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(parse_header_origins(origins))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

fn parse_header_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect()
}

/// Creates the application router with all routes
///
/// This function sets up the Axum router with all the API endpoints, the
/// static file service and the middleware stack (tracing, CORS, request
/// timeout and body size limit).
///
/// ### Arguments
///
/// * `state` - The state to be shared with all handlers
///
/// ### Returns
///
/// An Axum Router configured with all routes and the state attached
pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Accounts
        .route("/api/signup", post(signup_handler))
        .route("/api/login", post(login_handler))
        .route("/api/me", get(me_handler))
        // Uploads and edits
        .route("/api/upload", post(upload_image_handler))
        .route("/api/edit", post(edit_image_handler))
        .route("/api/images/{id}/process", post(process_image_handler))
        // Dashboard
        .route("/api/images", get(list_images_handler))
        .route("/api/images/{id}", get(get_image_handler).delete(delete_image_handler))
        .route("/api/images/{id}/download", get(download_edited_handler))
        .route("/api/images/{id}/original", get(download_original_handler))
        .route("/api/user-images/{user_id}", get(list_user_images_handler))
        .route("/api/user/stats", get(user_stats_handler))
        // Service
        .route("/healthz", get(health_handler))
        .route("/api/health", get(health_handler))
        .route("/docs", get(docs_handler))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, config.request_timeout()))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the embedded migrations
///
/// This function applies all pending database migrations. The server runs it
/// at startup and the tests run it against every fresh in-memory database.
///
/// ### Arguments
///
/// * `conn` - A mutable reference to a SQLite connection
pub fn run_migrations(conn: &mut diesel::SqliteConnection) -> anyhow::Result<()> {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    // Define the embedded migrations
    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow::anyhow!("Failed to run migrations: {}", err))?;

    if !applied.is_empty() {
        tracing::info!("Applied {} migrations", applied.len());
    }

    Ok(())
}
