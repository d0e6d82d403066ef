// Error types for receipt-ocr
// Author: kelexine (https://github.com/kelexine)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Missing API credential: set GEMINI_API_KEY or pass --api-key")]
    MissingCredential,

    #[error("Unsupported media type: {0} (supported: image/jpeg, image/png, application/pdf)")]
    UnsupportedMediaType(String),

    #[error("Inference request timed out after {0}s")]
    InferenceTimeout(u64),

    #[error("Inference service error: HTTP {status}: {message}")]
    InferenceService { status: u16, message: String },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),
}

impl ExtractError {
    /// Process exit code reported by the CLI for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExtractError::UnsupportedMediaType(_) | ExtractError::InvalidInput(_) => 2,
            ExtractError::MissingCredential => 3,
            ExtractError::InferenceTimeout(_) => 4,
            ExtractError::InferenceService { .. } => 5,
            ExtractError::MalformedResponse(_) => 6,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
