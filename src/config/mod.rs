// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{ExtractError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Config file (`explicit_path`, or `~/.receipt-ocr/config.toml` if present)
    /// 3. Defaults (lowest)
    ///
    /// CLI flags are applied on top by the caller.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let file_source = match explicit_path {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::with_name(&Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file_source)
            // Override with environment variables (e.g. RECEIPT_OCR__GEMINI__MODEL)
            .add_source(
                Environment::with_prefix("RECEIPT_OCR")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ExtractError::Config(e.to_string()))?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| ExtractError::Config(e.to_string()))?;

        // The plain GEMINI_API_KEY variable wins over the config file
        if let Some(key) = std::env::var(API_KEY_ENV).ok().and_then(ApiKey::new) {
            app_config.gemini.api_key = Some(key);
        }

        Ok(app_config)
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".receipt-ocr")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
