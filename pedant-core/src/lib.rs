//! # Pedant Core Library
//!
//! Lexical response selection for a fixed comedic persona.
//!
//! A [`CorpusIndex`] is built once from raw response records and then
//! queried once per conversational turn by the [`MatchingEngine`]:
//!
//! ```text
//! utterance ──► tokenize + stem ──► synonym expansion ──► IDF scoring
//!                                                           │
//!          SelectionResult ◄── weighted top-K ◄── recency × topic diversity
//! ```
//!
//! - **Corpus index**: validated, immutable records with memoized IDF
//!   weights, an inverted keyword index and a compiled synonym table.
//! - **Matching engine**: stateless; all per-session history lives in an
//!   explicit [`ConversationState`] and all randomness comes from a caller
//!   supplied [`rand::Rng`].
//!
//! ## Performance Contract
//!
//! Matching is O(postings touched + K log K) per turn with no I/O after the
//! index is built.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod matching;
pub mod state;
pub mod synonyms;
pub mod template;
pub mod text;
pub mod types;

pub use config::PedantConfig;
pub use corpus::{CategoryStats, CorpusIndex, CorpusStats};
pub use error::{CorpusValidationError, PedantError, Violation};
pub use matching::{MatchOutcome, MatchingEngine, QueryTrace, RankedCandidate, SelectionResult};
pub use state::ConversationState;
pub use synonyms::{SynonymSource, SynonymTable};
pub use template::TemplateContext;
pub use types::*;
