//! Configuration management for streamocr using the prefer crate.

mod loader;

pub use loader::{load_settings_with_options, LoadOptions, SERVER_URL_ENV, TIMEOUT_ENV};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::OcrError;
use crate::request::{GenerationParams, DEFAULT_MAX_TOKENS, DEFAULT_PROMPT, DEFAULT_TEMPERATURE};
use crate::thumbnails::DEFAULT_THUMBNAIL_SCALE;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base URL of the OCR service.
    pub server_url: Url,
    pub prompt: String,
    pub max_tokens: String,
    pub temperature: String,
    /// Connect timeout in seconds.
    pub request_timeout: u64,
    /// Custom User-Agent (None = streamocr default).
    pub user_agent: Option<String>,
    pub thumbnail_scale: f32,
    pub pdftoppm_path: PathBuf,
    pub pdfinfo_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            prompt: DEFAULT_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS.to_string(),
            temperature: DEFAULT_TEMPERATURE.to_string(),
            request_timeout: 30,
            user_agent: None,
            thumbnail_scale: DEFAULT_THUMBNAIL_SCALE,
            pdftoppm_path: PathBuf::from("pdftoppm"),
            pdfinfo_path: PathBuf::from("pdfinfo"),
        }
    }
}

fn default_server_url() -> Url {
    Url::parse(DEFAULT_SERVER_URL).unwrap_or_else(|_| unreachable!("default URL is valid"))
}

impl Settings {
    /// Generation parameters from these settings.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            prompt: self.prompt.clone(),
            max_tokens: self.max_tokens.clone(),
            temperature: self.temperature.clone(),
        }
    }

    /// Parse and set the server URL.
    pub fn set_server_url(&mut self, raw: &str) -> Result<(), OcrError> {
        self.server_url = Url::parse(raw)
            .map_err(|e| OcrError::Config(format!("Invalid server URL '{}': {}", raw, e)))?;
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// OCR service base URL.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "server")]
    pub server_url: Option<String>,
    /// Default prompt sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Connect timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Thumbnail scale relative to 72 DPI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdftoppm_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdfinfo_path: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no streamocr config file is found.
    pub async fn load() -> Self {
        match prefer::load("streamocr").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// The format follows the extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, OcrError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| OcrError::Config(format!("Failed to read config file: {}", e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, OcrError> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| OcrError::Config(format!("Failed to parse TOML config: {}", e))),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| OcrError::Config(format!("Failed to parse YAML config: {}", e))),
            _ => serde_json::from_str(contents)
                .map_err(|e| OcrError::Config(format!("Failed to parse JSON config: {}", e))),
        }
    }

    /// Directory of the config file, if it came from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a tool path.
    /// - `~` is expanded
    /// - Bare names (no separator) are left for PATH lookup
    /// - Other relative paths are resolved against `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() || path.components().count() == 1 {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) -> Result<(), OcrError> {
        if let Some(ref url) = self.server_url {
            settings.set_server_url(url)?;
        }
        if let Some(ref prompt) = self.prompt {
            settings.prompt = prompt.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            settings.max_tokens = max_tokens.to_string();
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature.to_string();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(scale) = self.thumbnail_scale {
            if scale <= 0.0 {
                return Err(OcrError::Config(format!(
                    "thumbnail_scale must be positive, got {}",
                    scale
                )));
            }
            settings.thumbnail_scale = scale;
        }
        if let Some(ref path) = self.pdftoppm_path {
            settings.pdftoppm_path = self.resolve_path(path, base_dir);
        }
        if let Some(ref path) = self.pdfinfo_path {
            settings.pdfinfo_path = self.resolve_path(path, base_dir);
        }
        Ok(())
    }
}
