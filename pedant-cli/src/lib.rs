//! # pedant-cli: the Pedant front end
//!
//! Wires the matching engine from `pedant-core` and the optional generation
//! backend from `pedant-llm` into an interactive conversation.
//!
//! ```text
//!  corpus dir ──► loader ──► MatchingEngine ──► Session ──► Repl ──► terminal
//!                                                  │
//!                                                  └──► Delegate ──► LLM (optional)
//! ```
//!
//! ## Modules
//!
//! - `loader`: corpus, synonyms and character profile from disk
//! - `session`: conversation state, seeded RNG, history, fallbacks, statistics
//! - `delegate`: persona prompt + LLM call, keeping the corpus reply on failure
//! - `repl`: line editing and slash commands
//! - `display`, `colors`: terminal rendering

pub mod colors;
pub mod delegate;
pub mod display;
pub mod loader;
pub mod repl;
pub mod session;

pub use delegate::Delegate;
pub use loader::{CannedResponses, ResponseLibrary, build_engine};
pub use repl::Repl;
pub use session::{Reply, ReplySource, Session, SessionStats};
