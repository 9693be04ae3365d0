use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use smartpix::dto::{
    AuthRequest, AuthResponse, EditResponse, ImageSummary, MeResponse, ProcessImageDto, StatsResponse,
    StatusResponse, UploadResponse,
};

/// Error type for CLI client operations
#[derive(Debug)]
pub enum ClientError {
    /// Server returned an error status with a message body
    Server { status: reqwest::StatusCode, message: String },
    /// Network/connection/request error
    Request(reqwest::Error),
    /// Reading or writing a local file failed
    Io(std::io::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status.as_u16(), message)
            }
            ClientError::Request(err) => write!(f, "{}", err),
            ClientError::Io(err) => write!(f, "File error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(err) => Some(err),
            ClientError::Io(err) => Some(err),
            ClientError::Server { .. } => None,
        }
    }
}

/// Extension trait for checking HTTP responses and extracting server error messages
trait ResponseExt {
    /// Checks for error status and extracts the server's error message body
    async fn check(self) -> Result<reqwest::Response, ClientError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self) -> Result<reqwest::Response, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status();
        let message = match self.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("Unknown error")
                .to_string(),
            Err(_) => format!("HTTP {}", status),
        };
        Err(ClientError::Server { status, message })
    }
}

/// HTTP client wrapper for communicating with the SmartPix server
pub struct SmartPixClient {
    /// The base URL of the server (e.g. "http://localhost:8000")
    base_url: String,
    /// Bearer token sent with every request, if any
    token: Option<String>,
    /// The underlying HTTP client
    client: Client,
}

impl SmartPixClient {
    /// Creates a new SmartPixClient
    ///
    /// ### Arguments
    ///
    /// * `base_url` - The base URL of the SmartPix server
    /// * `token` - Bearer token from a previous login
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        self.authorized(request)
            .send()
            .await
            .map_err(ClientError::Request)?
            .check()
            .await
    }

    // ── Account endpoints ────────────────────────────────────────────

    /// Registers a new account
    pub async fn signup(&self, email: String, password: String) -> Result<AuthResponse, ClientError> {
        let dto = AuthRequest { email, password };
        let response = self.send(self.client.post(self.url("/api/signup")).json(&dto)).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Logs in and returns a fresh token
    pub async fn login(&self, email: String, password: String) -> Result<AuthResponse, ClientError> {
        let dto = AuthRequest { email, password };
        let response = self.send(self.client.post(self.url("/api/login")).json(&dto)).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Gets the profile behind the current token
    pub async fn me(&self) -> Result<MeResponse, ClientError> {
        let response = self.send(self.client.get(self.url("/api/me"))).await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Image endpoints ──────────────────────────────────────────────

    /// Uploads a local image file
    pub async fn upload(&self, path: &Path) -> Result<UploadResponse, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(ClientError::Io)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self.send(self.client.post(self.url("/api/upload")).multipart(form)).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Lists the caller's images
    pub async fn list_images(&self) -> Result<Vec<ImageSummary>, ClientError> {
        let response = self.send(self.client.get(self.url("/api/images"))).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Gets one image
    pub async fn get_image(&self, id: &str) -> Result<ImageSummary, ClientError> {
        let response = self.send(self.client.get(self.url(&format!("/api/images/{}", id)))).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Applies an edit to an image
    pub async fn process_image(
        &self,
        id: &str,
        edit_type: String,
        intensity: Option<i64>,
    ) -> Result<EditResponse, ClientError> {
        let dto = ProcessImageDto { edit_type, intensity };
        let url = self.url(&format!("/api/images/{}/process", id));
        let response = self.send(self.client.post(url).json(&dto)).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Deletes an image and its edits
    pub async fn delete_image(&self, id: &str) -> Result<StatusResponse, ClientError> {
        let response = self.send(self.client.delete(self.url(&format!("/api/images/{}", id)))).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Downloads the latest edit, or the original when `original` is set
    pub async fn download(&self, id: &str, original: bool) -> Result<Vec<u8>, ClientError> {
        let which = if original { "original" } else { "download" };
        let url = self.url(&format!("/api/images/{}/{}", id, which));
        let response = self.send(self.client.get(url)).await?;
        Ok(response.bytes().await.map_err(ClientError::Request)?.to_vec())
    }

    /// Gets dashboard totals
    pub async fn stats(&self) -> Result<StatsResponse, ClientError> {
        let response = self.send(self.client.get(self.url("/api/user/stats"))).await?;
        response.json().await.map_err(ClientError::Request)
    }
}
