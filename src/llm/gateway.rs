use crate::error::Result;
use crate::llm::models::LlmMessage;
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

/// Configuration for text generation
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_output_tokens: 8192,
        }
    }
}

/// Abstract interface for hosted chat-model services.
///
/// A streaming completion yields text fragments in arrival order and
/// terminates by exhaustion; there is no end-of-stream sentinel. Any item
/// may be an error, after which the stream produces nothing further.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// List the models visible to the configured credential.
    ///
    /// Doubles as a connectivity and credential probe during session setup:
    /// a bad key or an unreachable endpoint fails here, before any chat
    /// request is attempted.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Open a streaming chat completion against `model`.
    ///
    /// `system_instruction` rides alongside the turn history rather than as
    /// a turn of its own.
    fn stream_chat<'a>(
        &'a self,
        model: &'a str,
        system_instruction: &'a str,
        messages: &'a [LlmMessage],
        config: &'a GenerationConfig,
    ) -> Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>>;
}
