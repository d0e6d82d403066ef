// Vision models and types
// Author: kelexine (https://github.com/kelexine)

use crate::error::{ExtractError, Result};
use std::path::Path;

/// Document formats the extraction prompt is sent with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    Pdf,
}

impl MediaType {
    /// Get MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Pdf => "application/pdf",
        }
    }

    /// Resolve a MIME string, failing with `UnsupportedMediaType` for anything else
    pub fn from_mime_type(mime: &str) -> Result<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(MediaType::Jpeg),
            "image/png" => Ok(MediaType::Png),
            "application/pdf" => Ok(MediaType::Pdf),
            _ => Err(ExtractError::UnsupportedMediaType(mime.to_string())),
        }
    }

    /// Resolve from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "jpg" | "jpeg" => Ok(MediaType::Jpeg),
            "png" => Ok(MediaType::Png),
            "pdf" => Ok(MediaType::Pdf),
            "" => Err(ExtractError::UnsupportedMediaType(format!(
                "{} (no file extension)",
                path.display()
            ))),
            other => Err(ExtractError::UnsupportedMediaType(format!(".{}", other))),
        }
    }
}

/// Validation limits
pub const MAX_INLINE_SIZE_BYTES: usize = 20 * 1024 * 1024; // 20MB (Gemini inline request limit)

/// Validate payload size
pub fn validate_payload_size(data_len: usize) -> Result<()> {
    if data_len == 0 {
        return Err(ExtractError::InvalidInput("document is empty".to_string()));
    }
    if data_len > MAX_INLINE_SIZE_BYTES {
        return Err(ExtractError::InvalidInput(format!(
            "Document size {} bytes exceeds maximum of {} bytes (20MB)",
            data_len, MAX_INLINE_SIZE_BYTES
        )));
    }
    Ok(())
}
