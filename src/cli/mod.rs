// CLI module for receipt-ocr
// Author: kelexine (https://github.com/kelexine)

use crate::config::{ApiKey, AppConfig};
use crate::models::ExtractionResult;
use clap::Parser;
use std::path::PathBuf;

/// receipt-ocr - Extract structured data from receipts and invoices with Gemini
#[derive(Parser, Debug)]
#[command(name = "receipt-ocr", version, about, long_about = None)]
pub struct Args {
    /// Receipt or invoice files (.jpg, .jpeg, .png, .pdf)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Write the JSON result to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the MIME type instead of inferring it from the extension
    #[arg(long)]
    pub mime_type: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model to use
    #[arg(long)]
    pub model: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Config file (default: ~/.receipt-ocr/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print JSON on a single line
    #[arg(long)]
    pub compact: bool,
}

impl Args {
    /// Apply flags on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(key) = self.api_key.clone().and_then(ApiKey::new) {
            config.gemini.api_key = Some(key);
        }
        if let Some(model) = &self.model {
            config.gemini.model = model.clone();
        }
        if let Some(timeout) = self.timeout {
            config.gemini.timeout_seconds = timeout;
        }
    }
}

/// Render results as program output: one object for a single file, an
/// array otherwise. Always ends with a newline.
pub fn render_results(results: &[ExtractionResult], compact: bool) -> serde_json::Result<String> {
    let value = match results {
        [single] => serde_json::to_value(single)?,
        _ => serde_json::to_value(results)?,
    };
    let mut rendered = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    rendered.push('\n');
    Ok(rendered)
}
