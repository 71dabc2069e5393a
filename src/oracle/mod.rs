pub mod app;
pub mod conversation;
pub mod observer;
pub mod prompts;
pub mod topics;

pub use app::{OracleApp, OracleConfig, RequestState};
pub use conversation::{Conversation, Message, Role};
pub use observer::{ChatObserver, NullObserver};
pub use topics::TopicSuggester;
