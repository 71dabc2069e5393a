pub mod error;
pub mod llm;
pub mod oracle;

pub use error::{OracleError, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{OracleError, Result};
    pub use crate::llm::gateways::GeminiGateway;
    pub use crate::llm::{ChatSession, GenerationConfig, LlmGateway, LlmMessage, MessageRole};
    pub use crate::oracle::{
        ChatObserver, Conversation, Message, NullObserver, OracleApp, OracleConfig, RequestState,
        Role, TopicSuggester,
    };
}
