//! The ordered message store behind the conversation view.

use serde::{Deserialize, Serialize};

/// Who authored a rendered message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single rendered message.
///
/// The role is fixed at creation. The text of the trailing model message is
/// rewritten repeatedly while a reply streams in; every other message is
/// immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a model message
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// An append-only ordered sequence of messages.
///
/// Insertion order is display order. Messages are never reordered or
/// removed; the only mutation besides appending is rewriting the text of
/// the last element, which the streaming path uses to fill the placeholder
/// reply in place.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Rewrite the text of the last message, leaving its role untouched.
    ///
    /// Does nothing on an empty conversation.
    pub fn set_last_text(&mut self, text: impl Into<String>) {
        if let Some(last) = self.messages.last_mut() {
            last.text = text.into();
        }
    }

    /// All messages in display order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recently appended message, if any
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
