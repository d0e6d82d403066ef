// Gemini API client
// Author: kelexine (https://github.com/kelexine)

use crate::config::GeminiConfig;
use crate::error::{ExtractError, Result};
use crate::extraction::InferenceRequest;
use crate::models::gemini::GenerateContentResponse;
use crate::utils::logging::sanitize;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// Upper bound on connection setup, never above the request timeout
const MAX_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Longest upstream error message carried into a diagnostic
const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// Client for the Google Gemini `generateContent` API.
///
/// Sends exactly one request per call. There is no retry: a timeout or a
/// non-2xx status is returned to the caller as a terminal error.
pub struct GeminiClient {
    http_client: Client,
    timeout_seconds: u64,
    connect_timeout_seconds: u64,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let connect_timeout_seconds = config.timeout_seconds.min(MAX_CONNECT_TIMEOUT_SECS);
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(connect_timeout_seconds))
            .use_rustls_tls()
            .build()
            .map_err(|e| ExtractError::Config(format!("Failed to create HTTP client: {}", e)))?;

        debug!(
            "Created HTTP client with {}s request timeout",
            config.timeout_seconds
        );

        Ok(Self {
            http_client,
            timeout_seconds: config.timeout_seconds,
            connect_timeout_seconds,
        })
    }

    /// Call `generateContent` and return the answer text of the first candidate.
    pub async fn generate_content(&self, request: &InferenceRequest) -> Result<String> {
        debug!("Calling generateContent: {}", request.url);

        let response = self
            .http_client
            .post(&request.url)
            .header("x-goog-api-key", request.api_key.expose())
            .json(&request.body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            let message = Self::extract_error_message(&response_text)
                .unwrap_or_else(|| response_text.clone());
            let message = single_line(&message);
            error!("Gemini API error: HTTP {} - {}", status, message);
            return Err(ExtractError::InferenceService {
                status: status.as_u16(),
                message,
            });
        }

        debug!(
            "Raw Gemini response (first 500 chars): {}",
            response_text.chars().take(500).collect::<String>()
        );

        let gemini_response: GenerateContentResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                ExtractError::MalformedResponse(format!("Response envelope parsing error: {}", e))
            })?;

        if let Some(usage) = &gemini_response.usage_metadata {
            debug!(
                "Token usage: prompt={:?} candidates={:?} total={:?}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        match gemini_response.candidate_text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => {
                let reason = gemini_response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone())
                    .or_else(|| {
                        gemini_response
                            .candidates
                            .first()
                            .and_then(|c| c.finish_reason.clone())
                    })
                    .unwrap_or_else(|| "none given".to_string());
                Err(ExtractError::MalformedResponse(format!(
                    "model returned no text (reason: {})",
                    reason
                )))
            }
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ExtractError {
        if e.is_timeout() {
            ExtractError::InferenceTimeout(self.timeout_for(e.is_connect()))
        } else {
            ExtractError::Http(e.without_url())
        }
    }

    /// The limit that fired: connection setup or the whole request.
    fn timeout_for(&self, during_connect: bool) -> u64 {
        if during_connect {
            self.connect_timeout_seconds
        } else {
            self.timeout_seconds
        }
    }

    /// Extract error message from API response JSON
    fn extract_error_message(response_text: &str) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(serde::Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(response_text) {
            if let Some(error) = error_resp.error {
                return error.message.or(error.status);
            }
        }
        None
    }
}

/// Collapse whitespace, redact keys, and cap the length of an upstream message.
fn single_line(message: &str) -> String {
    let collapsed = sanitize(&message.split_whitespace().collect::<Vec<_>>().join(" "));
    if collapsed.chars().count() > MAX_ERROR_MESSAGE_CHARS {
        let head: String = collapsed.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
        format!("{}...", head)
    } else {
        collapsed
    }
}
