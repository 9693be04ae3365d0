use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use sanitize_filename::sanitize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;

/// Extensions accepted for uploads, lowercase
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// URL prefix the static file service mounts the upload directory under
pub const UPLOAD_URL_PREFIX: &str = "/static/uploads";

/// URL prefix the static file service mounts the processed directory under
pub const PROCESSED_URL_PREFIX: &str = "/static/processed";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no filename supplied")]
    NoFilename,
    #[error("file extension is not allowed")]
    InvalidExtension,
    #[error("file exceeds {max_bytes} bytes")]
    TooLarge { max_bytes: usize },
    #[error("file is not a valid image")]
    InvalidImage,
    #[error("file not found: {0}")]
    Missing(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result of storing an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Name of the file inside the upload directory
    pub filename: String,
    /// Sanitized client-side name
    pub original_name: String,
    /// Public URL relative to the server root
    pub url: String,
    /// MIME type of the detected format
    pub content_type: String,
    pub size_bytes: i64,
}

/// Upload that passed validation but has not been written yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub original_name: String,
    pub extension: String,
    pub format: ImageFormat,
}

/// On-disk store for original uploads and processed results
#[derive(Debug, Clone)]
pub struct FileStore {
    upload_dir: PathBuf,
    processed_dir: PathBuf,
    max_upload_bytes: usize,
}

impl FileStore {
    /// Creates the store under `static_dir`, making sure both directories exist
    #[cfg(test)]
    pub fn new(static_dir: &Path, max_upload_bytes: usize) -> Result<Self, StorageError> {
        Self::with_dirs(static_dir.join("uploads"), static_dir.join("processed"), max_upload_bytes)
    }

    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        Self::with_dirs(config.upload_dir(), config.processed_dir(), config.max_upload_bytes)
    }

    fn with_dirs(upload_dir: PathBuf, processed_dir: PathBuf, max_upload_bytes: usize) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&upload_dir)?;
        std::fs::create_dir_all(&processed_dir)?;

        info!("File store ready at {:?} and {:?}", upload_dir, processed_dir);

        Ok(Self {
            upload_dir,
            processed_dir,
            max_upload_bytes,
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Checks an upload before anything touches the disk
    ///
    /// Checks run in a fixed order: filename, extension, size, then content.
    /// The content must decode as PNG, JPEG or WebP regardless of which of
    /// the allowed extensions the name carries.
    pub fn validate_upload(&self, filename: Option<&str>, bytes: &[u8]) -> Result<ValidatedUpload, StorageError> {
        let original_name = filename.map(sanitize).unwrap_or_default();
        if original_name.trim().is_empty() {
            return Err(StorageError::NoFilename);
        }

        let extension = Path::new(&original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or(StorageError::InvalidExtension)?;

        if bytes.len() > self.max_upload_bytes {
            return Err(StorageError::TooLarge {
                max_bytes: self.max_upload_bytes,
            });
        }

        let format = image::guess_format(bytes).map_err(|_| StorageError::InvalidImage)?;
        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP) {
            return Err(StorageError::InvalidImage);
        }
        image::load_from_memory_with_format(bytes, format).map_err(|_| StorageError::InvalidImage)?;

        Ok(ValidatedUpload {
            original_name,
            extension,
            format,
        })
    }

    /// Validates and writes an upload to the upload directory
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save_upload(&self, filename: Option<&str>, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        let upload = self.validate_upload(filename, bytes)?;

        let stem = Path::new(&upload.original_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(url_safe_stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "image".to_string());
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        let stored_name = format!("{}_{}.{}", stem, suffix, upload.extension);

        tokio::fs::write(self.upload_dir.join(&stored_name), bytes).await?;
        debug!("Wrote upload {}", stored_name);

        Ok(StoredFile {
            url: upload_url(&stored_name),
            filename: stored_name,
            original_name: upload.original_name,
            content_type: upload.format.to_mime_type().to_string(),
            size_bytes: bytes.len() as i64,
        })
    }

    /// Writes an edited image under a fresh name and returns that name
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save_processed(&self, bytes: &[u8], extension: &str) -> Result<String, StorageError> {
        let name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(self.processed_dir.join(&name), bytes).await?;
        debug!("Wrote processed image {}", name);
        Ok(name)
    }

    pub async fn read_upload(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        read_file(&self.upload_dir, filename).await
    }

    pub async fn read_processed(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        read_file(&self.processed_dir, filename).await
    }

    /// Removes an upload; a file that is already gone is not an error
    pub async fn remove_upload(&self, filename: &str) {
        remove_file(&self.upload_dir, filename).await
    }

    /// Removes a processed image; a file that is already gone is not an error
    pub async fn remove_processed(&self, filename: &str) {
        remove_file(&self.processed_dir, filename).await
    }
}

/// Public URL of a stored upload
pub fn upload_url(filename: &str) -> String {
    format!("{}/{}", UPLOAD_URL_PREFIX, filename)
}

/// Maps a file stem onto `[A-Za-z0-9._-]` so stored names are usable in URLs
///
/// Other characters become `_`; leading and trailing dots and underscores
/// are dropped.
fn url_safe_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Public URL of a processed image
pub fn processed_url(filename: &str) -> String {
    format!("{}/{}", PROCESSED_URL_PREFIX, filename)
}

/// MIME type for a stored file, judged by its extension
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Resolves a stored name inside `dir`, ignoring any directory components
fn resolve(dir: &Path, filename: &str) -> Option<PathBuf> {
    let name = Path::new(filename).file_name()?;
    Some(dir.join(name))
}

async fn read_file(dir: &Path, filename: &str) -> Result<Vec<u8>, StorageError> {
    let path = resolve(dir, filename).ok_or_else(|| StorageError::Missing(filename.to_string()))?;
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(StorageError::Missing(filename.to_string())),
        Err(err) => Err(StorageError::Io(err)),
    }
}

async fn remove_file(dir: &Path, filename: &str) {
    let Some(path) = resolve(dir, filename) else {
        return;
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => debug!("Removed {:?}", path),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!("Failed to remove {:?}: {}", path, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{encoded_image, png_bytes};
    use tempfile::TempDir;

    fn store(max: usize) -> (FileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path(), max).unwrap();
        (store, dir)
    }

    #[test]
    fn test_new_creates_directories() {
        let (_store, dir) = store(1024);
        assert!(dir.path().join("uploads").is_dir());
        assert!(dir.path().join("processed").is_dir());
    }

    #[test]
    fn test_validation_order() {
        let (store, _dir) = store(64);
        let png = png_bytes(2, 2);

        assert!(matches!(store.validate_upload(None, &png), Err(StorageError::NoFilename)));
        assert!(matches!(store.validate_upload(Some(""), &png), Err(StorageError::NoFilename)));
        // extension is checked before size
        assert!(matches!(
            store.validate_upload(Some("notes.txt"), &vec![0; 1000]),
            Err(StorageError::InvalidExtension)
        ));
        assert!(matches!(
            store.validate_upload(Some("big.png"), &vec![0; 1000]),
            Err(StorageError::TooLarge { max_bytes: 64 })
        ));
        assert!(matches!(
            store.validate_upload(Some("fake.png"), b"not an image"),
            Err(StorageError::InvalidImage)
        ));
    }

    #[test]
    fn test_validate_accepts_uppercase_extension() {
        let (store, _dir) = store(1024 * 1024);
        let jpeg = encoded_image(4, 4, ImageFormat::Jpeg);

        let upload = store.validate_upload(Some("Holiday.JPG"), &jpeg).unwrap();

        assert_eq!(upload.extension, "jpg");
        assert_eq!(upload.format, ImageFormat::Jpeg);
        assert_eq!(upload.original_name, "Holiday.JPG");
    }

    #[tokio::test]
    async fn test_save_upload_names_and_reads_back() {
        let (store, dir) = store(1024 * 1024);
        let png = png_bytes(3, 3);

        let stored = store.save_upload(Some("../my cat.png"), &png).await.unwrap();

        assert!(stored.filename.starts_with("my_cat_"));
        assert!(stored.filename.ends_with(".png"));
        assert!(!stored.filename.contains('/'));
        assert_eq!(stored.url, format!("/static/uploads/{}", stored.filename));
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(stored.size_bytes, png.len() as i64);
        assert!(dir.path().join("uploads").join(&stored.filename).is_file());

        assert_eq!(store.read_upload(&stored.filename).await.unwrap(), png);
    }

    #[tokio::test]
    async fn test_stored_name_is_url_safe() {
        let (store, _dir) = store(1024 * 1024);

        let stored = store.save_upload(Some("cat#1 50%.png"), &png_bytes(2, 2)).await.unwrap();

        assert!(stored.filename.starts_with("cat_1_50_"));
        assert!(stored.url.chars().all(|c| c.is_ascii_alphanumeric() || "/._-".contains(c)));
        // the display name keeps what the user typed
        assert_eq!(stored.original_name, "cat#1 50%.png");
    }

    #[test]
    fn test_url_safe_stem() {
        assert_eq!(url_safe_stem("holiday-2024_v2"), "holiday-2024_v2");
        assert_eq!(url_safe_stem("my photo#1"), "my_photo_1");
        assert_eq!(url_safe_stem("café?"), "caf");
        assert_eq!(url_safe_stem("..hidden"), "hidden");
        assert_eq!(url_safe_stem("%%%"), "");
    }

    #[tokio::test]
    async fn test_processed_round_trip_and_remove() {
        let (store, _dir) = store(1024);

        let name = store.save_processed(b"jpeg-bytes", "jpg").await.unwrap();
        assert!(name.ends_with(".jpg"));
        assert!(Uuid::parse_str(name.trim_end_matches(".jpg")).is_ok());
        assert_eq!(store.read_processed(&name).await.unwrap(), b"jpeg-bytes");

        store.remove_processed(&name).await;
        assert!(matches!(store.read_processed(&name).await, Err(StorageError::Missing(_))));

        // removing twice is fine
        store.remove_processed(&name).await;
    }

    #[tokio::test]
    async fn test_read_ignores_directory_components() {
        let (store, dir) = store(1024);
        std::fs::write(dir.path().join("secret.txt"), b"x").unwrap();

        let result = store.read_upload("../secret.txt").await;

        assert!(matches!(result, Err(StorageError::Missing(_))));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a"), "application/octet-stream");
    }

    #[test]
    fn test_urls() {
        assert_eq!(upload_url("a.png"), "/static/uploads/a.png");
        assert_eq!(processed_url("b.jpg"), "/static/processed/b.jpg");
    }
}
