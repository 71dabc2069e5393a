//! Gemini gateway for LLM interactions.
//!
//! This module provides a gateway for the Google Generative Language API,
//! covering model listing and streamed chat completions over SSE.

use crate::error::{OracleError, Result};
use crate::llm::gateway::{GenerationConfig, LlmGateway};
use crate::llm::models::{LlmMessage, MessageRole};
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use reqwest::Client;
use serde_json::Value;
use std::pin::Pin;
use tracing::{debug, info, warn};

/// Configuration for connecting to the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Option<std::time::Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("GEMINI_API_ENDPOINT")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            timeout: None,
        }
    }
}

/// Gateway for the hosted Gemini LLM service.
///
/// Requests authenticate with the `x-goog-api-key` header. Streaming uses
/// the `streamGenerateContent` endpoint with `alt=sse`, which delivers
/// newline-separated `data:` events until the response is complete.
pub struct GeminiGateway {
    client: Client,
    config: GeminiConfig,
}

impl GeminiGateway {
    /// Create a new Gemini gateway with default configuration.
    pub fn new() -> Self {
        Self::with_config(GeminiConfig::default())
    }

    /// Create a new Gemini gateway with custom configuration.
    pub fn with_config(config: GeminiConfig) -> Self {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build().unwrap();

        Self { client, config }
    }

    /// Create gateway with custom API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::with_config(GeminiConfig {
            api_key: api_key.into(),
            ..Default::default()
        })
    }

    /// Create gateway with custom API key and base URL.
    pub fn with_api_key_and_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::with_config(GeminiConfig {
            api_key: api_key.into(),
            base_url: base_url.into(),
            ..Default::default()
        })
    }
}

impl Default for GeminiGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    async fn list_models(&self) -> Result<Vec<String>> {
        debug!("Fetching available Gemini models");

        let response = self
            .client
            .get(format!("{}/models", self.config.base_url))
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OracleError::GatewayError(format!(
                "Failed to get models: {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;

        let models = body["models"]
            .as_array()
            .ok_or_else(|| OracleError::GatewayError("Invalid response format".to_string()))?
            .iter()
            .filter_map(|m| m["name"].as_str().map(String::from))
            .collect::<Vec<_>>();

        Ok(models)
    }

    fn stream_chat<'a>(
        &'a self,
        model: &'a str,
        system_instruction: &'a str,
        messages: &'a [LlmMessage],
        config: &'a GenerationConfig,
    ) -> Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>> {
        Box::pin(async_stream::stream! {
            info!("Starting Gemini streaming completion");
            debug!("Model: {}, turn count: {}", model, messages.len());

            let body = build_generate_request(system_instruction, messages, config);

            let response = match self
                .client
                .post(format!(
                    "{}/models/{}:streamGenerateContent",
                    self.config.base_url, model
                ))
                .query(&[("alt", "sse")])
                .header("x-goog-api-key", &self.config.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(OracleError::GatewayError(format!(
                    "Gemini API error: {}",
                    response.status()
                )));
                return;
            }

            // Process the SSE byte stream, one `data:` line at a time
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = stream.next().await {
                match chunk_result {
                    Ok(bytes) => {
                        if let Ok(text) = std::str::from_utf8(&bytes) {
                            buffer.push_str(text);

                            while let Some(newline_pos) = buffer.find('\n') {
                                let line = buffer[..newline_pos].trim().to_string();
                                buffer = buffer[newline_pos + 1..].to_string();

                                let payload = match line.strip_prefix("data:") {
                                    Some(p) => p.trim(),
                                    None => continue,
                                };

                                if payload.is_empty() {
                                    continue;
                                }

                                match serde_json::from_str::<Value>(payload) {
                                    Ok(json) => {
                                        if let Some(fragment) = extract_fragment(&json) {
                                            if !fragment.is_empty() {
                                                yield Ok(fragment);
                                            }
                                        }
                                    }
                                    Err(e) => {
                                        warn!("Failed to parse streaming chunk: {}", e);
                                    }
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(e.into());
                        return;
                    }
                }
            }
        })
    }
}

// Request body for generateContent-style endpoints. The system instruction
// is a dedicated field, not a turn in `contents`.
fn build_generate_request(
    system_instruction: &str,
    messages: &[LlmMessage],
    config: &GenerationConfig,
) -> Value {
    let contents: Vec<Value> = messages
        .iter()
        .map(|msg| {
            serde_json::json!({
                "role": match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Model => "model",
                },
                "parts": [{ "text": msg.text }]
            })
        })
        .collect();

    serde_json::json!({
        "system_instruction": { "parts": [{ "text": system_instruction }] },
        "contents": contents,
        "generationConfig": {
            "temperature": config.temperature,
            "maxOutputTokens": config.max_output_tokens,
        }
    })
}

// Concatenated text parts of the first candidate, if the event carries one
fn extract_fragment(json: &Value) -> Option<String> {
    let parts = json["candidates"].get(0)?["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    Some(text)
}
