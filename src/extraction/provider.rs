//! Extraction Providers
//!
//! Defines the provider trait and implementations for the vision model
//! backends that read menu photos.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{ExtractionError, ImagePayload};

/// Vision model provider trait
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Provider name, used in logs and error messages
    fn name(&self) -> &'static str;

    /// Send an image with an instruction and return the model's reply text
    async fn extract(&self, image: &ImagePayload, prompt: &str) -> Result<String, ExtractionError>;
}

/// Build the HTTP client shared by the providers
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

// ============================================================================
// Anthropic
// ============================================================================

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            max_tokens,
        }
    }

    fn request_body(&self, image: &ImagePayload, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": image.media_type,
                            "data": image.data,
                        }
                    },
                    { "type": "text", "text": prompt }
                ]
            }]
        })
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl ExtractionProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn extract(&self, image: &ImagePayload, prompt: &str) -> Result<String, ExtractionError> {
        let api_key = self.api_key.as_deref().ok_or(ExtractionError::MissingApiKey {
            provider: self.name(),
            env_var: "ANTHROPIC_API_KEY",
        })?;

        let url = format!("{}/v1/messages", self.base_url);

        tracing::debug!(
            model = %self.model,
            media_type = %image.media_type,
            size = image.decoded_len(),
            "Sending menu image to Anthropic"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(image, prompt))
            .send()
            .await
            .map_err(|e| ExtractionError::Request {
                provider: self.name(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api {
                provider: self.name(),
                status,
                body,
            });
        }

        let result: MessagesResponse =
            response.json().await.map_err(|e| ExtractionError::InvalidResponse {
                provider: self.name(),
                message: e.to_string(),
            })?;

        let text: String = result
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyResponse {
                provider: self.name(),
            });
        }

        Ok(text)
    }
}

// ============================================================================
// Ollama
// ============================================================================

/// Ollama vision model provider
pub struct OllamaProvider {
    client: reqwest::Client,
    /// Ollama API URL
    base_url: String,
    /// Model name (e.g., "llava", "bakllava")
    model: String,
}

impl OllamaProvider {
    pub fn new(client: reqwest::Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[async_trait]
impl ExtractionProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn extract(&self, image: &ImagePayload, prompt: &str) -> Result<String, ExtractionError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "images": [image.data],
            "stream": false
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Request {
                provider: self.name(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api {
                provider: self.name(),
                status,
                body,
            });
        }

        let result: GenerateResponse =
            response.json().await.map_err(|e| ExtractionError::InvalidResponse {
                provider: self.name(),
                message: e.to_string(),
            })?;

        match result.response {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ExtractionError::EmptyResponse {
                provider: self.name(),
            }),
        }
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    pub reply: Result<String, fn() -> ExtractionError>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Default::default(),
        }
    }

    pub fn failing(error: fn() -> ExtractionError) -> Self {
        Self {
            reply: Err(error),
            calls: Default::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl ExtractionProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn extract(
        &self,
        _image: &ImagePayload,
        _prompt: &str,
    ) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}
