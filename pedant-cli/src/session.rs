//! One conversation: matching state, randomness, history and statistics.
//!
//! The engine is stateless; a [`Session`] owns the [`ConversationState`] and
//! the single seeded RNG that every draw of the conversation goes through.

use chrono::{DateTime, Utc};
use pedant_core::config::SessionConfig;
use pedant_core::{
    ConversationState, Intensity, MatchOutcome, MatchingEngine, QueryTrace, RankedCandidate,
    RecordId,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;
use uuid::Uuid;

use crate::loader::CannedResponses;

/// Shown on `NoMatch` when the corpus ships no fallback or confusion lines.
pub const BUILTIN_FALLBACK: &str =
    "*beep boop* No fallback responses loaded. This is meta-embarrassing.";

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Where a reply came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    /// A matched corpus record.
    Corpus(RecordId),
    /// A fallback line after `NoMatch`.
    Fallback,
    /// The generation backend.
    Generated {
        /// Model that wrote it.
        model: String,
    },
}

/// What gets shown for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Main text.
    pub text: String,
    /// Follow-up, already filtered by the follow-up probability.
    pub follow_up: Option<String>,
    /// Sass level.
    pub intensity: Intensity,
    /// Origin.
    pub source: ReplySource,
    /// Ranked candidates behind the reply; empty for fallbacks.
    pub shortlist: Vec<RankedCandidate>,
}

impl Reply {
    /// Whether the generation backend wrote this reply.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        matches!(self.source, ReplySource::Generated { .. })
    }
}

/// One exchange in the session history.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// When the reply was recorded.
    pub at: DateTime<Utc>,
    /// What the user typed.
    pub utterance: String,
    /// Main reply text.
    pub reply: String,
    /// Sass level of the reply.
    pub intensity: Intensity,
    /// Origin of the reply.
    pub source: ReplySource,
}

/// Running totals for `/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Turns answered.
    pub turns: u64,
    /// Σ intensity over answered turns.
    pub total_intensity: u64,
    /// Turns answered with a fallback line.
    pub fallbacks: u64,
    /// Turns answered by the generation backend.
    pub generated: u64,
}

impl SessionStats {
    /// Mean sass level; 0 before the first turn.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_intensity(&self) -> f64 {
        if self.turns == 0 {
            0.0
        } else {
            self.total_intensity as f64 / self.turns as f64
        }
    }

    fn record(&mut self, reply: &Reply) {
        self.turns += 1;
        self.total_intensity += u64::from(reply.intensity.value());
        match reply.source {
            ReplySource::Corpus(_) => {}
            ReplySource::Fallback => self.fallbacks += 1,
            ReplySource::Generated { .. } => self.generated += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single conversation with the persona.
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    engine: MatchingEngine,
    state: ConversationState,
    rng: StdRng,
    canned: CannedResponses,
    follow_up_probability: f64,
    history: Vec<Turn>,
    stats: SessionStats,
}

impl Session {
    /// Start a session. A configured seed makes every draw reproducible.
    #[must_use]
    pub fn new(engine: MatchingEngine, canned: CannedResponses, config: &SessionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let follow_up_probability = if config.follow_up_probability.is_finite() {
            config.follow_up_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let id = Uuid::new_v4();
        debug!(session = %id, seed = ?config.seed, "session started");
        Self {
            id,
            started_at: Utc::now(),
            state: engine.new_state(),
            engine,
            rng,
            canned,
            follow_up_probability,
            history: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    /// Session id, for log correlation.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session started.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The matching engine.
    #[must_use]
    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    /// Recent selections.
    #[must_use]
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Every recorded exchange, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// The last `n` exchanges, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> &[Turn] {
        &self.history[self.history.len().saturating_sub(n)..]
    }

    /// Running totals.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Opening line, if the corpus has one.
    #[must_use]
    pub fn greeting(&self) -> Option<&str> {
        self.canned.meta.greeting.as_deref()
    }

    /// Closing line, if the corpus has one.
    #[must_use]
    pub fn goodbye(&self) -> Option<&str> {
        self.canned.meta.goodbye.as_deref()
    }

    /// Pick a reply for `utterance` without recording it.
    ///
    /// A match updates the conversation state; `NoMatch` falls back to a
    /// canned line and leaves the state alone.
    pub fn select(&mut self, utterance: &str) -> Reply {
        match self
            .engine
            .match_utterance(utterance, &mut self.state, &mut self.rng)
        {
            MatchOutcome::Selected(selection) => {
                let show_follow_up = selection.follow_up.is_some()
                    && self.rng.gen_bool(self.follow_up_probability);
                Reply {
                    text: selection.body,
                    follow_up: selection.follow_up.filter(|_| show_follow_up),
                    intensity: selection.intensity,
                    source: ReplySource::Corpus(selection.id),
                    shortlist: selection.shortlist,
                }
            }
            MatchOutcome::NoMatch => self.fallback(),
        }
    }

    fn fallback(&mut self) -> Reply {
        let (text, intensity) = match self.canned.fallbacks.choose(&mut self.rng) {
            Some(fallback) => (fallback.text.clone(), fallback.intensity),
            None => (
                self.canned
                    .meta
                    .confusion
                    .clone()
                    .unwrap_or_else(|| BUILTIN_FALLBACK.to_string()),
                Intensity::NEUTRAL,
            ),
        };
        Reply {
            text,
            follow_up: None,
            intensity,
            source: ReplySource::Fallback,
            shortlist: Vec::new(),
        }
    }

    /// Append a shown reply to the history and statistics.
    pub fn record(&mut self, utterance: &str, reply: &Reply) {
        self.stats.record(reply);
        self.history.push(Turn {
            at: Utc::now(),
            utterance: utterance.trim().to_string(),
            reply: reply.text.clone(),
            intensity: reply.intensity,
            source: reply.source.clone(),
        });
    }

    /// [`Self::select`] then [`Self::record`].
    pub fn respond(&mut self, utterance: &str) -> Reply {
        let reply = self.select(utterance);
        self.record(utterance, &reply);
        reply
    }

    /// How `utterance` would be ranked right now. Leaves the state untouched.
    #[must_use]
    pub fn why(&self, utterance: &str) -> (QueryTrace, Vec<RankedCandidate>) {
        (
            self.engine.explain(utterance),
            self.engine.rank(utterance, &self.state),
        )
    }
}
