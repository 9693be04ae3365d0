use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default size limit for uploaded images (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default JWT lifetime: one week
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 7;

/// Longest accepted JWT lifetime: ten years
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 366 * 10;

/// Largest accepted upload limit (1 GiB)
pub const MAX_UPLOAD_LIMIT_BYTES: usize = 1024 * 1024 * 1024;

/// Which implementation performs image edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorBackend {
    /// Built-in pixel pipeline, no network access
    Local,
    /// OpenAI image variations API
    OpenAi,
}

impl std::str::FromStr for EditorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(EditorBackend::Local),
            "openai" => Ok(EditorBackend::OpenAi),
            other => Err(format!("Unknown editor backend: {}", other)),
        }
    }
}

/// Configuration for the SmartPix server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Root of the served static tree; uploads and processed images live below it
    pub static_dir: PathBuf,
    /// Origin prepended to stored relative URLs in API responses
    pub public_base_url: String,
    /// Secret used to sign JWTs
    pub jwt_secret: Option<String>,
    /// Lifetime of issued tokens in minutes
    pub token_ttl_minutes: i64,
    /// Origins allowed to make cross-origin requests
    pub allowed_origins: Vec<String>,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Image editing backend
    pub editor_backend: EditorBackend,
    /// API key for the OpenAI backend
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI API
    pub openai_base_url: String,
    /// Directory for rolling JSON log files
    pub log_dir: Option<PathBuf>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub token_ttl_minutes: Option<i64>,
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub editor_backend: Option<EditorBackend>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub openai_base_url: Option<String>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "smartpix", about = "SmartPix image editing backend")]
pub struct CliArgs {
    /// Path to a TOML config file (defaults to the XDG config dir)
    #[clap(long, env = "SMARTPIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Interface to bind
    #[clap(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to bind
    #[clap(long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory holding uploads and processed images
    #[clap(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Public origin used to build absolute image URLs
    #[clap(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// JWT signing secret
    #[clap(long, env = "SECRET_KEY", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in minutes
    #[clap(long, env = "TOKEN_TTL_MINUTES")]
    pub token_ttl_minutes: Option<i64>,

    /// Comma-separated list of allowed CORS origins
    #[clap(long, env = "ALLOWED_ORIGINS")]
    pub allowed_origins: Option<String>,

    /// Maximum upload size in bytes
    #[clap(long, env = "MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Request timeout in seconds
    #[clap(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Image editing backend: local or openai
    #[clap(long, env = "EDITOR_BACKEND")]
    pub editor_backend: Option<EditorBackend>,

    /// OpenAI API key
    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL
    #[clap(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// Directory for rolling log files
    #[clap(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Debug mode
    #[clap(long, env = "SMARTPIX_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            host: update.host.unwrap_or(self.host),
            port: update.port.unwrap_or(self.port),
            static_dir: update.static_dir.unwrap_or(self.static_dir),
            public_base_url: update.public_base_url.unwrap_or(self.public_base_url),
            jwt_secret: update.jwt_secret.or(self.jwt_secret),
            token_ttl_minutes: update.token_ttl_minutes.unwrap_or(self.token_ttl_minutes),
            allowed_origins: update.allowed_origins.unwrap_or(self.allowed_origins),
            max_upload_bytes: update.max_upload_bytes.unwrap_or(self.max_upload_bytes),
            request_timeout_secs: update.request_timeout_secs.unwrap_or(self.request_timeout_secs),
            editor_backend: update.editor_backend.unwrap_or(self.editor_backend),
            openai_api_key: update.openai_api_key.or(self.openai_api_key),
            openai_base_url: update.openai_base_url.unwrap_or(self.openai_base_url),
            log_dir: update.log_dir.or(self.log_dir),
        }
    }

    /// Directory that receives raw uploads
    pub fn upload_dir(&self) -> PathBuf {
        self.static_dir.join("uploads")
    }

    /// Directory that receives edited images
    pub fn processed_dir(&self) -> PathBuf {
        self.static_dir.join("processed")
    }

    /// Returns the token lifetime as a chrono Duration
    ///
    /// Values outside what `validate` accepts fall back to the default.
    pub fn token_ttl(&self) -> chrono::Duration {
        Some(self.token_ttl_minutes)
            .filter(|minutes| (1..=MAX_TOKEN_TTL_MINUTES).contains(minutes))
            .and_then(chrono::Duration::try_minutes)
            .unwrap_or_else(|| chrono::Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES))
    }

    /// Returns the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Address string suitable for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checks combinations that can only be rejected once all layers are merged
    pub fn validate(&self) -> Result<(), String> {
        if self.token_ttl_minutes <= 0 {
            return Err("token_ttl_minutes must be positive".to_string());
        }
        if self.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(format!("token_ttl_minutes must be at most {}", MAX_TOKEN_TTL_MINUTES));
        }
        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be positive".to_string());
        }
        if self.max_upload_bytes > MAX_UPLOAD_LIMIT_BYTES {
            return Err(format!("max_upload_bytes must be at most {}", MAX_UPLOAD_LIMIT_BYTES));
        }
        if self.editor_backend == EditorBackend::OpenAi
            && self.openai_api_key.as_deref().is_none_or(|key| key.trim().is_empty())
        {
            return Err("OPENAI_API_KEY must be set when the openai editor backend is selected".to_string());
        }
        Ok(())
    }
}

/// Splits a comma-separated origin list, trimming entries and dropping empties
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the base (default) configuration
pub fn base_config(config_path: Option<PathBuf>) -> Config {
    let database_url = config_path.map_or("smartpix.db".to_string(), |path| {
        path.join("smartpix.db").to_string_lossy().to_string()
    });

    Config {
        database_url,
        host: "0.0.0.0".to_string(),
        port: 8000,
        static_dir: PathBuf::from("static"),
        public_base_url: "http://localhost:8000".to_string(),
        jwt_secret: None,
        token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        allowed_origins: Vec::new(),
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        request_timeout_secs: 120,
        editor_backend: EditorBackend::Local,
        openai_api_key: None,
        openai_base_url: "https://api.openai.com/v1".to_string(),
        log_dir: None,
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments (and their env fallbacks)
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        host: args.host,
        port: args.port,
        static_dir: args.static_dir,
        public_base_url: args.public_base_url,
        jwt_secret: args.jwt_secret,
        token_ttl_minutes: args.token_ttl_minutes,
        allowed_origins: args.allowed_origins.as_deref().map(parse_origins),
        max_upload_bytes: args.max_upload_bytes,
        request_timeout_secs: args.request_timeout_secs,
        editor_backend: args.editor_backend,
        openai_api_key: args.openai_api_key,
        openai_base_url: args.openai_base_url,
        log_dir: args.log_dir,
    }
}

/// Returns the XDG config directory for SmartPix, if it can be determined
pub fn get_config_dir_path() -> Option<PathBuf> {
    match ProjectDirs::from("com", "smartpix", "smartpix") {
        Some(proj_dirs) => Some(proj_dirs.config_dir().to_path_buf()),
        None => {
            warn!("Could not determine XDG config directory, skipping config file");
            None
        }
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(mut args: CliArgs) -> Result<Config, String> {
    let config_dir = get_config_dir_path().and_then(|path| {
        if !path.exists() {
            info!("Config path not found at {:?}, using defaults", path);
            None
        } else {
            Some(path)
        }
    });

    let config_file = args
        .config
        .take()
        .or_else(|| config_dir.as_ref().map(|dir| dir.join("config.toml")));

    let base = base_config(config_dir);

    let config = base
        .apply_update(config_from_file(config_file)?)
        .apply_update(config_from_args(args));

    config.validate()?;

    info!(
        "Final configuration: database_url={}, bind={}, static_dir={:?}, editor={:?}, origins={:?}",
        config.database_url,
        config.bind_address(),
        config.static_dir,
        config.editor_backend,
        config.allowed_origins
    );

    Ok(config)
}
