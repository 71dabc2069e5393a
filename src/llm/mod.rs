pub mod gateway;
pub mod gateways;
pub mod models;
pub mod session;

pub use gateway::{GenerationConfig, LlmGateway};
pub use models::{LlmMessage, MessageRole};
pub use session::ChatSession;
