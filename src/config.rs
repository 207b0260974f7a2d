//! Configuration management for myai
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{MyAiError, Result};
use crate::models::{
    ImageModel, ImageSize, ImageStyle, GUIDANCE_SCALE_RANGE, NUM_IMAGES_RANGE, STEPS_RANGE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for myai
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend service settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Local storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Chat behavior
    #[serde(default)]
    pub chat: ChatConfig,
    /// Defaults for the image generation form
    #[serde(default)]
    pub images: ImageDefaults,
}

/// Backend service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the `/api/...` endpoints hang off
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database path; the platform data directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Messages of the active session sent as context
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
}

fn default_context_limit() -> usize {
    crate::client::CHAT_CONTEXT_LIMIT
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_limit: default_context_limit(),
        }
    }
}

/// Image generation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDefaults {
    #[serde(default)]
    pub model: ImageModel,
    #[serde(default)]
    pub size: ImageSize,
    #[serde(default)]
    pub style: ImageStyle,
    #[serde(default = "default_num_images")]
    pub num_images: u32,
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,
    #[serde(default = "default_steps")]
    pub steps: u32,
}

fn default_num_images() -> u32 {
    1
}

fn default_guidance_scale() -> f32 {
    7.5
}

fn default_steps() -> u32 {
    20
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self {
            model: ImageModel::default(),
            size: ImageSize::default(),
            style: ImageStyle::default(),
            num_images: default_num_images(),
            guidance_scale: default_guidance_scale(),
            steps: default_steps(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MyAiError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MyAiError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("MYAI_API_BASE") {
            self.api.base_url = base_url;
        }

        if let Ok(path) = std::env::var(crate::storage::STORAGE_PATH_ENV) {
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Ok(model) = std::env::var("MYAI_DEFAULT_MODEL") {
            match model.parse() {
                Ok(value) => self.images.model = value,
                Err(e) => tracing::warn!("Invalid MYAI_DEFAULT_MODEL: {}", e),
            }
        }

        if let Ok(size) = std::env::var("MYAI_DEFAULT_SIZE") {
            match size.parse() {
                Ok(value) => self.images.size = value,
                Err(e) => tracing::warn!("Invalid MYAI_DEFAULT_SIZE: {}", e),
            }
        }

        if let Ok(style) = std::env::var("MYAI_DEFAULT_STYLE") {
            match style.parse() {
                Ok(value) => self.images.style = value,
                Err(e) => tracing::warn!("Invalid MYAI_DEFAULT_STYLE: {}", e),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.api_base {
            self.api.base_url = base_url.clone();
        }
        if let Some(path) = &cli.storage_path {
            self.storage.path = Some(path.clone());
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `MyAiError::Config` if any check fails
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.api.base_url).map_err(|e| {
            MyAiError::Config(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MyAiError::Config(format!(
                "api.base_url must use http or https, got {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.chat.context_limit == 0 {
            return Err(MyAiError::Config(
                "chat.context_limit must be greater than 0".to_string(),
            )
            .into());
        }

        if !NUM_IMAGES_RANGE.contains(&self.images.num_images) {
            return Err(MyAiError::Config(format!(
                "images.num_images must be between {} and {}",
                NUM_IMAGES_RANGE.start(),
                NUM_IMAGES_RANGE.end()
            ))
            .into());
        }

        if !GUIDANCE_SCALE_RANGE.contains(&self.images.guidance_scale) {
            return Err(MyAiError::Config(format!(
                "images.guidance_scale must be between {} and {}",
                GUIDANCE_SCALE_RANGE.start(),
                GUIDANCE_SCALE_RANGE.end()
            ))
            .into());
        }

        if !STEPS_RANGE.contains(&self.images.steps) {
            return Err(MyAiError::Config(format!(
                "images.steps must be between {} and {}",
                STEPS_RANGE.start(),
                STEPS_RANGE.end()
            ))
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            chat: ChatConfig::default(),
            images: ImageDefaults::default(),
        }
    }
}
