//! Anthropic Messages API generation backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use jotter_core::{defaults, Error, GenerationBackend, Result};

/// Default Anthropic endpoint.
pub const DEFAULT_ANTHROPIC_URL: &str = defaults::ANTHROPIC_URL;

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = defaults::GEN_MODEL;

/// Deadline for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = defaults::GEN_TIMEOUT_SECS;

/// Anthropic Messages API backend.
///
/// Each call is a single user-role message with an explicit `max_tokens`
/// budget and a per-request deadline. A deadline expiry surfaces as
/// [`Error::Inference`], which enrichment callers treat exactly like a
/// parse failure.
pub struct AnthropicBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicBackend {
    /// Create a backend with default endpoint, model, and deadline.
    pub fn new(api_key: String) -> Self {
        Self::with_config(
            DEFAULT_ANTHROPIC_URL.to_string(),
            api_key,
            DEFAULT_GEN_MODEL.to_string(),
            GEN_TIMEOUT_SECS,
        )
    }

    /// Create a backend with custom configuration.
    pub fn with_config(base_url: String, api_key: String, model: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        debug!(
            subsystem = "inference",
            component = "anthropic",
            model = %model,
            timeout_secs,
            "Initializing Anthropic backend"
        );

        Self {
            client,
            base_url,
            api_key,
            model,
            timeout_secs,
        }
    }

    /// Create from environment variables.
    ///
    /// `ANTHROPIC_API_KEY` is required; `ANTHROPIC_BASE_URL`,
    /// `JOTTER_AI_MODEL`, and `JOTTER_AI_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| Error::Config("ANTHROPIC_API_KEY is not set".to_string()))?;
        let base_url = std::env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_ANTHROPIC_URL.to_string());
        let model =
            std::env::var("JOTTER_AI_MODEL").unwrap_or_else(|_| DEFAULT_GEN_MODEL.to_string());
        let timeout_secs = std::env::var("JOTTER_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(GEN_TIMEOUT_SECS);

        Ok(Self::with_config(base_url, api_key, model, timeout_secs))
    }
}

#[async_trait]
impl GenerationBackend for AnthropicBackend {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "anthropic", op = "generate", model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let start = Instant::now();

        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", defaults::ANTHROPIC_VERSION)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "inference",
                component = "anthropic",
                status = %status,
                "Anthropic returned an error"
            );
            return Err(Error::Inference(format!(
                "Anthropic returned {}: {}",
                status, body
            )));
        }

        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let text = result
            .content
            .iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text.clone())
            .ok_or_else(|| Error::Inference("Completion carried no text block".to_string()))?;

        debug!(
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> AnthropicBackend {
        AnthropicBackend::with_config(
            server.uri(),
            "test-key".to_string(),
            "test-model".to_string(),
            2,
        )
    }

    #[tokio::test]
    async fn test_generate_returns_first_text_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "hello from the model"}]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let out = backend.generate("hi", 100).await.unwrap();
        assert_eq!(out, "hello from the model");
    }

    #[tokio::test]
    async fn test_generate_skips_non_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "thinking"},
                    {"type": "text", "text": "actual answer"}
                ]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let out = backend.generate("hi", 100).await.unwrap();
        assert_eq!(out, "actual answer");
    }

    #[tokio::test]
    async fn test_generate_http_error_is_inference_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let err = backend.generate("hi", 100).await.unwrap_err();
        match err {
            Error::Inference(msg) => assert!(msg.contains("529")),
            other => panic!("Expected Inference error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_no_text_block_is_inference_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": []
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        assert!(backend.generate("hi", 100).await.is_err());
    }

    #[tokio::test]
    async fn test_generate_deadline_expiry_is_inference_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(serde_json::json!({
                        "content": [{"type": "text", "text": "too late"}]
                    })),
            )
            .mount(&server)
            .await;

        let backend = AnthropicBackend::with_config(
            server.uri(),
            "test-key".to_string(),
            "test-model".to_string(),
            1,
        );
        let err = backend.generate("hi", 100).await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }
}
