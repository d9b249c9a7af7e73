//! Settings resolution: config file, then environment.

use std::path::PathBuf;

use super::{Config, Settings};
use crate::error::OcrError;

pub const SERVER_URL_ENV: &str = "STREAMOCR_SERVER_URL";
pub const TIMEOUT_ENV: &str = "STREAMOCR_TIMEOUT";

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Server URL from the command line; beats config and environment.
    pub server_url: Option<String>,
}

/// Load config from the explicit path, or discover it via prefer.
async fn load_file_config(options: &LoadOptions) -> Result<Config, OcrError> {
    match options.config_path {
        Some(ref path) => {
            let path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
            Config::load_from_path(&path).await
        }
        None => Ok(Config::load().await),
    }
}

/// Apply environment overrides. Empty values are ignored.
fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), OcrError> {
    if let Some(url) = lookup(SERVER_URL_ENV).filter(|s| !s.is_empty()) {
        tracing::debug!("Using {} from environment: {}", SERVER_URL_ENV, url);
        settings.set_server_url(&url)?;
    }

    if let Some(timeout) = lookup(TIMEOUT_ENV).filter(|s| !s.is_empty()) {
        settings.request_timeout = timeout.trim().parse().map_err(|_| {
            OcrError::Config(format!("{} must be a number of seconds", TIMEOUT_ENV))
        })?;
    }

    Ok(())
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), OcrError> {
    let config = load_file_config(&options).await?;

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;

    if let Some(ref url) = options.server_url {
        settings.set_server_url(url)?;
    }

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    Ok((settings, config))
}
