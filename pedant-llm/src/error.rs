//! LLM error types.

use thiserror::Error;

/// Errors that can occur while delegating to a language model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// Response body was not the JSON shape the provider documents.
    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    /// The model answered with nothing usable.
    #[error("LLM returned an empty completion")]
    EmptyCompletion,

    /// Request timed out.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// LLM provider is unavailable.
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),

    /// The server is up but the configured model is not installed.
    #[error("model '{model}' not found (available: {})", available.join(", "))]
    ModelMissing {
        /// Model that was asked for.
        model: String,
        /// Models the server reported.
        available: Vec<String>,
    },

    /// All retry attempts exhausted.
    #[error("All LLM retry attempts exhausted after {attempts} tries: {last_error}")]
    RetriesExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// Error from the final attempt.
        last_error: String,
    },

    /// Configuration error.
    #[error("LLM configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}
