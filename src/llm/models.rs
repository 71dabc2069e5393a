use serde::{Deserialize, Serialize};

/// Role of a turn in the LLM-side conversation.
///
/// The Gemini API only knows two turn roles; the system instruction travels
/// outside the turn list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

/// A single turn in the LLM-side conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub text: String,
}

impl LlmMessage {
    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    /// Create a model turn
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Model,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_serialization() {
        assert_eq!(serde_json::to_string(&MessageRole::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&MessageRole::Model).unwrap(), "\"model\"");
    }

    #[test]
    fn test_message_role_deserialization() {
        assert_eq!(serde_json::from_str::<MessageRole>("\"user\"").unwrap(), MessageRole::User);
        assert_eq!(serde_json::from_str::<MessageRole>("\"model\"").unwrap(), MessageRole::Model);
    }

    #[test]
    fn test_user_message() {
        let msg = LlmMessage::user("Hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.text, "Hello");
    }

    #[test]
    fn test_model_message() {
        let msg = LlmMessage::model("The ancient texts speak");
        assert_eq!(msg.role, MessageRole::Model);
        assert_eq!(msg.text, "The ancient texts speak");
    }

    #[test]
    fn test_llm_message_serialization() {
        let msg = LlmMessage::user("test content");
        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"text\":\"test content\""));
    }

    #[test]
    fn test_llm_message_deserialization() {
        let json = r#"{"role":"model","text":"response"}"#;
        let msg: LlmMessage = serde_json::from_str(json).unwrap();

        assert_eq!(msg.role, MessageRole::Model);
        assert_eq!(msg.text, "response");
    }
}
