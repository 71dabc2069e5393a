//! Random topic suggestions for the input field.

use crate::error::{OracleError, Result};
use crate::oracle::prompts::STOCK_TOPICS;
use rand::Rng;

/// Picks one entry uniformly at random from a fixed candidate list.
///
/// The list is validated at construction; `suggest` itself cannot fail.
/// Suggesting has no interaction with the request state: a suggestion made
/// while a reply is streaming is simply pending input, not a dispatch.
pub struct TopicSuggester {
    topics: Vec<String>,
}

impl TopicSuggester {
    /// Create a suggester over a custom candidate list.
    ///
    /// An empty list is a configuration error, rejected eagerly rather than
    /// letting `suggest` fail at call time.
    pub fn new(topics: Vec<String>) -> Result<Self> {
        if topics.is_empty() {
            return Err(OracleError::ConfigError(
                "topic candidate list is empty".to_string(),
            ));
        }
        Ok(Self { topics })
    }

    /// Suggester preloaded with the Oracle's stock topics.
    pub fn stock() -> Self {
        Self {
            topics: STOCK_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// One candidate chosen uniformly at random.
    pub fn suggest(&self) -> &str {
        let idx = rand::thread_rng().gen_range(0..self.topics.len());
        &self.topics[idx]
    }

    /// The candidate list
    pub fn topics(&self) -> &[String] {
        &self.topics
    }
}
