//! Core types for LLM requests and responses.

use serde::{Deserialize, Serialize};

/// A request to the LLM.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// System prompt (character profile).
    pub system: String,
    /// User prompt (matched context, instructions, the utterance).
    pub user: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Sequences that end generation early.
    pub stop: Vec<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// A persona reply request: short, fairly creative, stops at a blank line
    /// or a role marker.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 200,
            temperature: 0.8,
            stop: vec!["\n\n".into(), "User:".into(), "Assistant:".into()],
            timeout_ms: 30_000,
        }
    }

    /// Set sampling parameters.
    #[must_use]
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// A response from the LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    /// The generated text, trimmed.
    pub text: String,
    /// How many tokens were generated, when the provider reports it.
    pub tokens_generated: u32,
    /// Latency of the successful attempt in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}
