//! Receipt extraction pipeline.
//!
//! Wires the request builder, the Gemini client, and the response validator
//! into a single call per document.
//!
//! # Submodules
//!
//! - `prompt`: Instruction text and `responseSchema` sent with each document.
//! - `request`: Builds the `generateContent` request from bytes and a media type.
//! - `validate`: Strips, parses, and normalizes the model output.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod prompt;
pub mod request;
pub mod validate;

pub use request::{InferenceRequest, RequestBuilder};
pub use validate::validate_response;

use crate::config::GeminiConfig;
use crate::error::{ExtractError, Result};
use crate::gemini::GeminiClient;
use crate::models::ExtractionResult;
use crate::vision::MediaType;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// One-shot extractor: one inference call per document.
pub struct ReceiptExtractor {
    builder: RequestBuilder,
    client: GeminiClient,
}

impl ReceiptExtractor {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        Ok(Self {
            builder: RequestBuilder::new(config),
            client: GeminiClient::new(config)?,
        })
    }

    /// Extract from in-memory bytes with an explicit MIME type.
    pub async fn extract(&self, bytes: &[u8], mime_type: &str) -> Result<ExtractionResult> {
        let media_type = MediaType::from_mime_type(mime_type)?;
        self.extract_media(bytes, media_type).await
    }

    /// Extract from a file. The media type comes from `mime_override` or the extension.
    pub async fn extract_file(
        &self,
        path: &Path,
        mime_override: Option<&str>,
    ) -> Result<ExtractionResult> {
        if !path.is_file() {
            return Err(ExtractError::InvalidInput(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let media_type = match mime_override {
            Some(mime) => MediaType::from_mime_type(mime)?,
            None => MediaType::from_path(path)?,
        };

        let bytes = tokio::fs::read(path).await?;
        info!("Extracting {} ({})", path.display(), media_type.mime_type());
        self.extract_media(&bytes, media_type).await
    }

    async fn extract_media(&self, bytes: &[u8], media_type: MediaType) -> Result<ExtractionResult> {
        let request = self.builder.build_for(bytes, media_type)?;

        let start = Instant::now();
        let raw = self.client.generate_content(&request).await?;
        info!(
            "Model {} answered in {:?} ({} chars)",
            self.builder.model(),
            start.elapsed(),
            raw.len()
        );

        validate_response(&raw)
    }
}
