//! Fixed texts of the Oracle: persona, canned notices, and stock topics.

/// Default model identifier for the Oracle
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// The reference text the Oracle draws on, embedded at compile time
pub const BOOK_TEXT: &str = include_str!("../../assets/history_of_magic.txt");

/// Greeting shown once the session is established
pub const GREETING: &str = "Greetings, seeker. I am the Occult Oracle, keeper of ancient lore \
     from the History of Magic. Ask, and the knowledge of the ages shall be revealed to you.";

/// Apology shown when the session could not be established
pub const INIT_FAILURE_NOTICE: &str = "The spirits are restless... I am unable to connect with \
     the ancient texts at this moment. Please check the ethereal connections (API Key) and try \
     again.";

/// Notice that replaces a reply interrupted mid-stream
pub const STREAM_FAILURE_NOTICE: &str =
    "A disturbance in the ether has interrupted our connection. Please ask again.";

/// Stock questions the topic suggester draws from
pub const STOCK_TOPICS: &[&str] = &[
    "What is the difference between white and black magic?",
    "Tell me about the visions of the saints.",
    "Explain the concept of somnambulism.",
    "What were the ancient beliefs about talismans?",
    "Describe the practice of divination among the Greeks.",
];

/// Assemble the Oracle's system instruction around the reference text.
pub fn system_instruction() -> String {
    format!(
        "You are the Occult Oracle. Your knowledge is based *exclusively* on the provided text, \
         'The History of Magic' by Joseph Ennemoser. Answer questions in a mystical, scholarly \
         tone, drawing directly from the book's content. Do not use any information outside of \
         this text. If the book does not contain an answer, state that the ancient texts are \
         silent on that matter. The full text is as follows: {}",
        BOOK_TEXT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_text_is_embedded() {
        assert!(BOOK_TEXT.contains("THE HISTORY OF MAGIC"));
        assert!(BOOK_TEXT.contains("JOSEPH ENNEMOSER"));
    }

    #[test]
    fn test_system_instruction_carries_book_text() {
        let instruction = system_instruction();
        assert!(instruction.starts_with("You are the Occult Oracle."));
        assert!(instruction.contains("THE HISTORY OF MAGIC"));
    }

    #[test]
    fn test_stock_topics_non_empty() {
        assert!(!STOCK_TOPICS.is_empty());
    }
}
