use crate::*;
use crate::config::{base_config, Config};
use crate::editor::LocalEditor;
use crate::models::Image;
use diesel::connection::SimpleConnection;
use diesel::RunQueryDsl;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

/// Sets up a test database with migrations applied
///
/// This function:
/// 1. Creates an in-memory SQLite database
/// 2. Enables foreign key constraints
/// 3. Runs all migrations to set up the schema
///
/// ### Returns
///
/// An Arc-wrapped database connection pool connected to the in-memory database
pub fn setup_test_db() -> Arc<db::DbPool> {
    // Plain ":memory:" gives each connection its own database, so migrations
    // run on one connection would be invisible to the others. A unique
    // shared-cache URI keeps the pool on one database per test.
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = db::init_pool(&database_url).expect("Failed to build pool");

    let mut conn = pool.get().expect("Failed to get connection");
    conn.batch_execute("PRAGMA foreign_keys = ON").unwrap();
    run_migrations(&mut conn).expect("Failed to run migrations");

    Arc::new(pool)
}

/// Builds an image record without touching the file system
pub fn sample_image(user_id: &str, name: &str, size_bytes: i64) -> Image {
    Image::new(
        user_id.to_string(),
        format!("stored_{}", name),
        name.to_string(),
        format!("/static/uploads/stored_{}", name),
        "image/png".to_string(),
        size_bytes,
    )
}

/// Encodes a small gradient image in the given format
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// PNG bytes for a small gradient image
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, ImageFormat::Png)
}

/// Configuration pointing at a temporary static directory
pub fn test_config(static_dir: &std::path::Path) -> Config {
    let mut config = base_config(None);
    config.static_dir = static_dir.to_path_buf();
    config.jwt_secret = Some("test-secret".to_string());
    config
}

/// Application state backed by an in-memory database and a temporary directory
///
/// The returned `TempDir` must outlive the state.
pub fn test_state() -> (AppState, TempDir) {
    let dir = TempDir::new().unwrap();
    let state = AppState::new(
        setup_test_db(),
        test_config(dir.path()),
        Arc::new(LocalEditor::new()),
    )
    .unwrap();
    (state, dir)
}

use diesel::sql_types::Text;
use diesel::QueryableByName;

#[derive(QueryableByName, Debug)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Tests the setup_test_db function
///
/// This test verifies that:
/// 1. The test database can be created and connected to
/// 2. The database has the expected tables
#[tokio::test]
async fn test_setup_test_db() {
    let pool = setup_test_db();
    let mut conn = pool.get().unwrap();

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE '__diesel%' ORDER BY name",
    )
    .load(&mut conn)
    .unwrap();

    let names: Vec<String> = tables.into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["edits", "images", "users"]);
}

#[test]
fn test_png_bytes_decode() {
    let bytes = png_bytes(8, 6);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (8, 6));
}
