use crate::cli::Args;
use crate::core::error::AssistError;
use crate::orchestrator::ResponseMode;
use crate::providers::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_HISTORY_WINDOW: usize = 5;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;
const DEFAULT_LOG_LEVEL: &str = "warn";

fn default_true() -> bool {
    true
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

/// Contents of `~/.gyneassist/config.yaml`. The credential never lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_true")]
    pub streaming: bool,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: None,
            base_url: None,
            streaming: true,
            history_window: DEFAULT_HISTORY_WINDOW,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_level: None,
        }
    }
}

impl Config {
    fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gyneassist")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    pub fn load() -> Result<Config, AssistError> {
        Self::load_from(&Self::config_path())
    }

    /// Read the config at `path`, writing a default one first if none exists.
    pub fn load_from(path: &Path) -> Result<Config, AssistError> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            return serde_yml::from_str::<Config>(&contents)
                .map_err(|e| AssistError::Config(format!("Parse {}: {}", path.display(), e)));
        }

        let config = Config::default();
        // A read-only home directory should not prevent startup.
        if let Err(e) = config.save_to(path) {
            debug!(path = %path.display(), error = %e, "could not write default config");
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AssistError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml_content = serde_yml::to_string(self)?;
        fs::write(path, yaml_content)?;
        Ok(())
    }
}

/// Effective settings after layering CLI flags over the config file over defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub mode: ResponseMode,
    pub history_window: usize,
    pub max_upload_bytes: u64,
}

impl Settings {
    pub fn resolve(config: &Config, args: &Args, api_key: String) -> Self {
        let streaming = config.streaming && !args.no_stream;
        Self {
            api_key,
            model: args
                .model
                .clone()
                .or_else(|| config.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: args
                .base_url
                .clone()
                .or_else(|| config.base_url.clone())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            mode: if streaming {
                ResponseMode::Streaming
            } else {
                ResponseMode::SingleShot
            },
            history_window: config.history_window,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Log filter directive: CLI flag, then config file, then the default.
pub fn log_level(config: &Config, args: &Args) -> String {
    args.log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// Validate the credential read from the environment.
pub fn require_api_key(value: Option<String>) -> Result<String, AssistError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(AssistError::Config(format!(
            "{} environment variable not set. Add it to your environment or a .env file",
            API_KEY_ENV
        ))),
    }
}
