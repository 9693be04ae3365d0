/// Image editing backends
///
/// Handlers only see the [`ImageEditor`] trait. The concrete backend is
/// picked from configuration at startup: the built-in pixel pipeline
/// ([`LocalEditor`]) or the OpenAI image variations API ([`OpenAiEditor`]).

mod local;
mod openai;

pub use local::LocalEditor;
pub use openai::OpenAiEditor;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, EditorBackend};
use crate::models::EditType;

/// Intensity used when a request does not name one
pub const DEFAULT_INTENSITY: u8 = 50;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("unsupported edit type: {0}")]
    UnsupportedEditType(String),
    #[error("intensity must be between 0 and 100, got {0}")]
    InvalidIntensity(i64),
    #[error("could not decode image: {0}")]
    Decode(image::ImageError),
    #[error("could not encode image: {0}")]
    Encode(image::ImageError),
    #[error("image API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("image API returned an unexpected response: {0}")]
    Upstream(String),
    #[error("image task failed: {0}")]
    Task(String),
    #[error("editor is misconfigured: {0}")]
    Config(String),
}

/// Output of an edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedImage {
    pub bytes: Vec<u8>,
    /// File extension for the stored result, without the dot
    pub extension: &'static str,
    pub content_type: &'static str,
}

/// Something that can turn an image into an edited image
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Applies `edit_type` at `intensity` (0 to 100) to the encoded input image
    async fn edit(&self, input: &[u8], edit_type: EditType, intensity: u8) -> Result<EditedImage, EditorError>;
}

/// Parses a wire edit type name
pub fn parse_edit_type(name: &str) -> Result<EditType, EditorError> {
    name.parse().map_err(EditorError::UnsupportedEditType)
}

/// Checks that an intensity lies in 0..=100
pub fn validate_intensity(value: i64) -> Result<u8, EditorError> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or(EditorError::InvalidIntensity(value))
}

/// Builds the editor selected in the configuration
pub fn build_editor(config: &Config) -> Result<Arc<dyn ImageEditor>, EditorError> {
    let editor: Arc<dyn ImageEditor> = match config.editor_backend {
        EditorBackend::Local => Arc::new(LocalEditor::new()),
        EditorBackend::OpenAi => {
            let key = config
                .openai_api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| EditorError::Config("OPENAI_API_KEY is not set".to_string()))?;
            Arc::new(OpenAiEditor::new(key, config.openai_base_url.clone(), config.request_timeout())?)
        }
    };

    info!("Using {} image editor", editor.name());

    Ok(editor)
}
