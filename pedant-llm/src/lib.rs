//! # pedant-llm: Generative Delegation for Pedant
//!
//! Optional second opinion for a turn: the corpus selection's shortlist is
//! handed to a language model as context and the model answers in persona.
//!
//!   - **Ollama** (local, default) via `/api/generate`, with a `/api/tags`
//!     health check that also confirms the model is pulled
//!   - **OpenAI-compatible API** via `/v1/chat/completions`
//!   - **None**: every call fails, so the caller keeps the corpus reply
//!
//! Every call has a hard timeout and bounded retries. Failures are returned
//! as [`LlmError`]; nothing here decides what the user sees.

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use error::LlmError;
pub use prompt::{CandidateSnippet, PersonaPrompt};
pub use types::{LlmRequest, LlmResponse};
