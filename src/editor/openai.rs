use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::{imageops::FilterType, ImageFormat};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{EditedImage, EditorError, ImageEditor};
use crate::models::EditType;

/// Largest square side the variations endpoint accepts
const MAX_SIDE: u32 = 1024;

const VARIATION_SIZE: &str = "512x512";
const VARIATION_MODEL: &str = "dall-e-2";

#[derive(Debug, Deserialize)]
struct VariationResponse {
    data: Vec<VariationData>,
}

#[derive(Debug, Deserialize)]
struct VariationData {
    url: Option<String>,
}

/// Editor backed by the OpenAI image variations API
///
/// The variations endpoint takes no prompt, so the edit type and intensity
/// only show up in logs.
pub struct OpenAiEditor {
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAiEditor {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, EditorError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Requests one variation and returns the URL of the generated image
    async fn request_variation(&self, png: Vec<u8>) -> Result<String, EditorError> {
        let part = Part::bytes(png).file_name("image.png").mime_str("image/png")?;
        let form = Form::new()
            .part("image", part)
            .text("n", "1")
            .text("size", VARIATION_SIZE)
            .text("model", VARIATION_MODEL);

        let response = self
            .client
            .post(format!("{}/images/variations", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Image API returned {}: {}", status, body);
            return Err(EditorError::Upstream(format!("image API returned status {}", status.as_u16())));
        }

        let parsed: VariationResponse = response
            .json()
            .await
            .map_err(|err| EditorError::Upstream(format!("malformed image API response: {}", err)))?;

        parsed
            .data
            .into_iter()
            .find_map(|data| data.url)
            .ok_or_else(|| EditorError::Upstream("image API response contained no image URL".to_string()))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, EditorError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EditorError::Upstream(format!(
                "downloading the generated image returned status {}",
                status.as_u16()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ImageEditor for OpenAiEditor {
    fn name(&self) -> &'static str {
        "openai"
    }

    #[instrument(skip(self, input), fields(size = input.len()))]
    async fn edit(&self, input: &[u8], edit_type: EditType, intensity: u8) -> Result<EditedImage, EditorError> {
        info!("Requesting {} variation at intensity {}", edit_type, intensity);

        let input = input.to_vec();
        let png = tokio::task::spawn_blocking(move || square_png(&input))
            .await
            .map_err(|err| EditorError::Task(err.to_string()))??;

        let url = self.request_variation(png).await?;
        debug!("Downloading generated image from {}", url);
        let bytes = self.download(&url).await?;

        let (extension, content_type) = match image::guess_format(&bytes) {
            Ok(ImageFormat::Jpeg) => ("jpg", "image/jpeg"),
            Ok(ImageFormat::WebP) => ("webp", "image/webp"),
            Ok(ImageFormat::Png) => ("png", "image/png"),
            _ => return Err(EditorError::Upstream("generated file is not an image".to_string())),
        };

        Ok(EditedImage {
            bytes,
            extension,
            content_type,
        })
    }
}

/// Crops the centre square of an image and encodes it as PNG
pub(crate) fn square_png(input: &[u8]) -> Result<Vec<u8>, EditorError> {
    let img = image::load_from_memory(input).map_err(EditorError::Decode)?;
    let side = img.width().min(img.height());
    let x = (img.width() - side) / 2;
    let y = (img.height() - side) / 2;
    let mut square = img.crop_imm(x, y, side, side);
    if side > MAX_SIDE {
        square = square.resize_exact(MAX_SIDE, MAX_SIDE, FilterType::Lanczos3);
    }

    let mut out = Cursor::new(Vec::new());
    square.write_to(&mut out, ImageFormat::Png).map_err(EditorError::Encode)?;
    Ok(out.into_inner())
}
