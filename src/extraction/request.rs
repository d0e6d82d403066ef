// Inference request construction
// Author: kelexine (https://github.com/kelexine)

use super::prompt::{response_schema, EXTRACTION_PROMPT};
use crate::config::{ApiKey, GeminiConfig};
use crate::error::{ExtractError, Result};
use crate::models::gemini::{Content, GenerateContentRequest, GenerationConfig, Part};
use crate::vision::{encode_inline_data, MediaType};
use tracing::debug;

/// A fully prepared `generateContent` call.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Endpoint, e.g. `{base}/models/gemini-2.5-flash:generateContent`.
    pub url: String,
    /// Sent as the `x-goog-api-key` header.
    pub api_key: ApiKey,
    pub body: GenerateContentRequest,
}

/// Builds one extraction request per document.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    api_base_url: String,
    model: String,
    credential: Option<ApiKey>,
}

impl RequestBuilder {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            credential: config.api_key.clone(),
        }
    }

    /// Build a request from a MIME type string.
    ///
    /// Checks run in order: media type, payload size, credential. None of
    /// them touch the network.
    pub fn build(&self, bytes: &[u8], mime_type: &str) -> Result<InferenceRequest> {
        let media_type = MediaType::from_mime_type(mime_type)?;
        self.build_for(bytes, media_type)
    }

    /// Build a request for an already resolved media type.
    pub fn build_for(&self, bytes: &[u8], media_type: MediaType) -> Result<InferenceRequest> {
        let inline_data = encode_inline_data(bytes, media_type)?;
        let api_key = self.credential.clone().ok_or(ExtractError::MissingCredential)?;

        debug!(
            "Built extraction request for {} ({} bytes, model {})",
            inline_data.mime_type,
            bytes.len(),
            self.model
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: EXTRACTION_PROMPT.to_string(),
                        thought: None,
                    },
                    Part::InlineData { inline_data },
                ],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(response_schema().clone()),
            }),
        };

        Ok(InferenceRequest {
            url: format!("{}/models/{}:generateContent", self.api_base_url, self.model),
            api_key,
            body,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: Option<&str>) -> GeminiConfig {
        GeminiConfig {
            api_base_url: "https://example.test/v1beta/".to_string(),
            api_key: key.and_then(ApiKey::new),
            ..GeminiConfig::default()
        }
    }

    #[test]
    fn test_request_shape() {
        let builder = RequestBuilder::new(&config_with_key(Some("AIzaTest")));
        let request = builder.build(b"\xFF\xD8\xFF\xE0", "image/jpeg").unwrap();

        assert_eq!(
            request.url,
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(request.api_key.expose(), "AIzaTest");

        let json = serde_json::to_value(&request.body).unwrap();
        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(parts.len(), 2);
        assert!(parts[0]["text"].as_str().unwrap().contains("raw_text"));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[1]["inlineData"]["data"], "/9j/4A==");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "object");
    }

    #[test]
    fn test_unsupported_media_type_checked_before_credential() {
        let builder = RequestBuilder::new(&config_with_key(None));
        let result = builder.build(b"GIF89a", "image/gif");
        assert!(matches!(result, Err(ExtractError::UnsupportedMediaType(_))));
    }

    #[test]
    fn test_missing_credential() {
        let builder = RequestBuilder::new(&config_with_key(None));
        let result = builder.build(b"%PDF-1.7", "application/pdf");
        assert!(matches!(result, Err(ExtractError::MissingCredential)));
    }
}
