//! Chat session bound to a fixed system instruction and model.
//!
//! A [`ChatSession`] owns the LLM-side turn history for one conversation.
//! The system instruction and model identifier are fixed at build time and
//! every streamed exchange replays the accumulated history to the gateway.

use crate::error::Result;
use crate::llm::gateway::{GenerationConfig, LlmGateway};
use crate::llm::models::LlmMessage;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;

/// A chat session over a single gateway-backed conversation.
///
/// # Examples
///
/// ```ignore
/// use occult_oracle::llm::gateways::GeminiGateway;
/// use occult_oracle::llm::ChatSession;
/// use futures::stream::StreamExt;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let gateway = Arc::new(GeminiGateway::new());
///     let mut session = ChatSession::builder("gemini-2.5-flash", gateway)
///         .system_instruction("You are a terse librarian.")
///         .build();
///
///     let mut stream = session.send_stream("What is somnambulism?");
///     while let Some(fragment) = stream.next().await {
///         print!("{}", fragment?);
///     }
///
///     Ok(())
/// }
/// ```
pub struct ChatSession {
    gateway: Arc<dyn LlmGateway>,
    model: String,
    system_instruction: String,
    history: Vec<LlmMessage>,
    config: GenerationConfig,
}

impl ChatSession {
    /// Create a new session with default settings.
    pub fn new(model: impl Into<String>, gateway: Arc<dyn LlmGateway>) -> Self {
        Self::builder(model, gateway).build()
    }

    /// Create a session builder for custom configuration.
    pub fn builder(model: impl Into<String>, gateway: Arc<dyn LlmGateway>) -> ChatSessionBuilder {
        ChatSessionBuilder::new(model, gateway)
    }

    /// Send a message and stream the reply.
    ///
    /// The user turn is recorded immediately; fragments are yielded as they
    /// arrive from the gateway. Once the stream is exhausted the assembled
    /// reply is recorded as a model turn. If the stream errors, the error is
    /// yielded, the stream ends, and no model turn is recorded.
    pub fn send_stream<'a>(
        &'a mut self,
        query: &str,
    ) -> Pin<Box<dyn Stream<Item = Result<String>> + 'a>> {
        self.history.push(LlmMessage::user(query));

        // Snapshot the turns for the outbound request
        let turns = self.history.clone();

        Box::pin(async_stream::stream! {
            let mut accumulated = String::new();
            let mut inner = self.gateway.stream_chat(
                &self.model,
                &self.system_instruction,
                &turns,
                &self.config,
            );

            while let Some(result) = inner.next().await {
                match &result {
                    Ok(fragment) => {
                        accumulated.push_str(fragment);
                        yield result;
                    }
                    Err(_) => {
                        yield result;
                        return;
                    }
                }
            }

            // Stream consumed; record the assembled reply
            drop(inner);
            self.history.push(LlmMessage::model(accumulated));
        })
    }

    /// The model identifier this session is bound to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The system instruction this session is bound to
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// The LLM-side turn history accumulated so far
    pub fn history(&self) -> &[LlmMessage] {
        &self.history
    }
}

/// Builder for constructing a `ChatSession` with custom configuration.
pub struct ChatSessionBuilder {
    gateway: Arc<dyn LlmGateway>,
    model: String,
    system_instruction: String,
    config: GenerationConfig,
}

impl ChatSessionBuilder {
    fn new(model: impl Into<String>, gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            model: model.into(),
            system_instruction: "You are a helpful assistant.".to_string(),
            config: GenerationConfig::default(),
        }
    }

    /// Set the system instruction (default: "You are a helpful assistant.")
    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Set the generation configuration (default: `GenerationConfig::default()`)
    pub fn config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the chat session
    pub fn build(self) -> ChatSession {
        ChatSession {
            gateway: self.gateway,
            model: self.model,
            system_instruction: self.system_instruction,
            history: Vec::new(),
            config: self.config,
        }
    }
}
