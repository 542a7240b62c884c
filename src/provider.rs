//! Vision-model access: the [`VisionModel`] seam and the Gemini implementation.
//!
//! The pipeline never talks to a provider directly. It goes through the
//! [`VisionModel`] trait object injected at call time, so tests can script
//! responses and callers can swap providers or wrap the client with their own
//! middleware. There is deliberately no process-wide client: construct one,
//! share it with `Arc`.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// A page image ready for the transport boundary: base64 body plus MIME tag.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Base64-encoded image bytes.
    pub data: String,
    /// MIME type sent with the payload.
    pub mime_type: &'static str,
}

impl ImagePayload {
    /// Wrap base64 data as a JPEG payload.
    pub fn jpeg(data: String) -> Self {
        Self {
            data,
            mime_type: "image/jpeg",
        }
    }
}

/// Transport-level failures from a model provider.
///
/// These never escape the extractor: [`crate::pipeline::extract`] maps them
/// into [`crate::error::PageError`] and the page is skipped.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Credentials rejected (401/403). Retrying will not help.
    #[error("authentication rejected by model provider: {0}")]
    Auth(String),

    /// HTTP 429 from the provider.
    #[error("model provider rate limit exceeded")]
    RateLimited,

    /// The call exceeded the client timeout.
    #[error("model call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection-level failure.
    #[error("network error calling model provider: {0}")]
    Network(String),

    /// The provider answered with something other than the expected shape.
    #[error("invalid response from model provider: {0}")]
    InvalidResponse(String),
}

/// A multimodal model that can answer a text instruction about one image.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// from concurrent tasks.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send one image plus one instruction, return the model's raw text.
    async fn generate(&self, image: &ImagePayload, prompt: &str) -> Result<String, ModelError>;
}

/// Gemini `generateContent` client.
///
/// One request per page: the JPEG payload inline-base64 plus the instruction
/// text, low temperature so the model stays faithful to what is printed on
/// the page.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Build a client with an explicit key, model id, and per-call timeout.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ExtractError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            model: model.into(),
            api_key: api_key.into(),
            timeout_secs,
        })
    }

    /// Build a client from the config, falling back to the `GEMINI_API_KEY`
    /// then `GOOGLE_API_KEY` environment variables for the key.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()))
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty()))
            .ok_or(ExtractError::ModelNotConfigured)?;
        Self::new(api_key, config.model.clone(), config.api_timeout_secs)
    }

    /// Model id this client targets.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(&self, image: &ImagePayload, prompt: &str) -> Result<String, ModelError> {
        let endpoint = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let payload = serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [
                        { "inline_data": { "mime_type": image.mime_type, "data": image.data } },
                        { "text": prompt }
                    ]
                }
            ],
            "generationConfig": { "temperature": 0.1 }
        });

        let response = self
            .http
            .post(endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ModelError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    ModelError::Network(err.to_string())
                }
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ModelError::Auth(format!("HTTP {}", response.status())))
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(ModelError::RateLimited),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ModelError::InvalidResponse(format!(
                    "status {status}: {body}"
                )));
            }
            _ => {}
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| ModelError::InvalidResponse(err.to_string()))?;
        let text = body
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(|item| item.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .and_then(|parts| parts.first())
            .and_then(|part| part.get("text"))
            .and_then(Value::as_str)
            .ok_or_else(|| ModelError::InvalidResponse("response has no text candidate".into()))?;

        debug!("Model answered {} chars for {}", text.len(), self.model);
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_payload_is_tagged() {
        let payload = ImagePayload::jpeg("aGVsbG8=".into());
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(payload.data, "aGVsbG8=");
    }

    #[test]
    fn client_construction_with_explicit_key() {
        let client = GeminiClient::new("test-key", "gemini-2.0-flash", 60).unwrap();
        assert_eq!(client.model(), "gemini-2.0-flash");
    }

    #[test]
    fn model_error_display() {
        let e = ModelError::Timeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
        assert!(ModelError::RateLimited.to_string().contains("rate limit"));
    }
}
