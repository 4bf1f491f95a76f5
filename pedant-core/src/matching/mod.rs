//! Response selection: lexical ranking with recency and topic-diversity
//! adjustment, followed by a weighted draw among the top-K.
//!
//! Stages, per turn:
//!   1. tokenize + stem the utterance
//!   2. expand stems through the synonym table, add detected multi-word keywords
//!   3. IDF-weighted overlap plus a phrase bonus
//!   4. recency penalty from [`ConversationState`]
//!   5. topic diversity multiplier
//!   6. rank, cut to top-K, draw
//!   7. push the choice onto the state and render its templates

pub mod scoring;

use std::collections::BTreeSet;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use tracing::{debug, warn};

use crate::config::{MatchingConfig, SelectionStrategy};
use crate::corpus::CorpusIndex;
use crate::state::ConversationState;
use crate::template::{TemplateContext, render};
use crate::types::{Category, Intensity, RecordId};

/// One ranked record with its score breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    /// Record id.
    pub id: RecordId,
    /// Record category.
    pub category: Category,
    /// Number of query keywords the record carries.
    pub overlap: usize,
    /// Σ IDF over matched keywords.
    pub raw_score: f64,
    /// Phrase bonus added to the raw score (0 when no phrase matched).
    pub phrase_bonus: f64,
    /// Recency multiplier applied.
    pub recency: f64,
    /// Topic-diversity multiplier applied.
    pub diversity: f64,
    /// Final adjusted score.
    pub score: f64,
}

/// A selected response with its templates resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    /// Chosen record id.
    pub id: RecordId,
    /// Chosen record category.
    pub category: Category,
    /// Rendered body.
    pub body: String,
    /// Rendered follow-up, if the record has one.
    pub follow_up: Option<String>,
    /// The record's sass level.
    pub intensity: Intensity,
    /// The top-K the draw was made from, best first.
    pub shortlist: Vec<RankedCandidate>,
}

/// Outcome of one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// A record was chosen.
    Selected(SelectionResult),
    /// No record had lexical evidence; the caller supplies a fallback.
    NoMatch,
}

impl MatchOutcome {
    /// The selection, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&SelectionResult> {
        match self {
            Self::Selected(s) => Some(s),
            Self::NoMatch => None,
        }
    }

    /// Whether this is [`MatchOutcome::NoMatch`].
    #[must_use]
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch)
    }
}

/// How an utterance was interpreted, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTrace {
    /// Stems of the utterance, in order.
    pub stems: Vec<String>,
    /// Multi-word keywords found contiguously in the stems.
    pub phrases: BTreeSet<String>,
    /// Full query keyword set (synonym expansions plus phrases).
    pub query: BTreeSet<String>,
}

/// Stateless matcher over a shared corpus index.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    index: Arc<CorpusIndex>,
    config: MatchingConfig,
}

impl MatchingEngine {
    /// Create an engine over `index`.
    #[must_use]
    pub fn new(index: Arc<CorpusIndex>, config: MatchingConfig) -> Self {
        Self { index, config }
    }

    /// The index being queried.
    #[must_use]
    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    /// Active tuning.
    #[must_use]
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// A state sized for this engine's windows.
    #[must_use]
    pub fn new_state(&self) -> ConversationState {
        ConversationState::from_config(&self.config)
    }

    /// Stages 1–2: normalize the utterance and build the query keyword set.
    #[must_use]
    pub fn explain(&self, utterance: &str) -> QueryTrace {
        let stems = self.index.normalizer().normalize(utterance);
        let phrases = self.index.detect_phrases(&stems);

        let mut query: BTreeSet<String> = stems
            .iter()
            .flat_map(|stem| self.index.expand(stem))
            .collect();
        query.extend(phrases.iter().cloned());

        QueryTrace {
            stems,
            phrases,
            query,
        }
    }

    /// Stages 1–6 without the draw: the top-K candidates, best first.
    ///
    /// Does not touch `state`. Ties are ordered by id ascending.
    #[must_use]
    pub fn rank(&self, utterance: &str, state: &ConversationState) -> Vec<RankedCandidate> {
        let trace = self.explain(utterance);
        self.rank_trace(&trace, state)
    }

    fn rank_trace(&self, trace: &QueryTrace, state: &ConversationState) -> Vec<RankedCandidate> {
        if trace.query.is_empty() {
            return Vec::new();
        }

        let evidence = scoring::gather_evidence(&self.index, &trace.query, &trace.phrases);
        let mut ranked: Vec<RankedCandidate> = evidence
            .into_iter()
            .filter(|(_, e)| e.overlap > 0 || e.phrase_hit)
            .filter_map(|(i, e)| {
                let record = self.index.record_at(i);
                let phrase_bonus = if e.phrase_hit {
                    self.config.phrase_bonus
                } else {
                    0.0
                };
                let recency = scoring::recency_factor(
                    state.position_of(record.id.as_str()),
                    &self.config.recency,
                );
                let diversity = scoring::diversity_factor(
                    state.category_count(record.category),
                    &self.config.diversity,
                );
                let score = (e.raw_score + phrase_bonus) * recency * diversity;
                (score > 0.0).then(|| RankedCandidate {
                    id: record.id.clone(),
                    category: record.category,
                    overlap: e.overlap,
                    raw_score: e.raw_score,
                    phrase_bonus,
                    recency,
                    diversity,
                    score,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            OrderedFloat(b.score)
                .cmp(&OrderedFloat(a.score))
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked.truncate(self.config.top_k);
        ranked
    }

    /// Select a response for `utterance`, updating `state` on success.
    ///
    /// All randomness comes from `rng`; with a fixed seed, corpus, state and
    /// utterance the chosen id is always the same.
    pub fn match_utterance<R: Rng + ?Sized>(
        &self,
        utterance: &str,
        state: &mut ConversationState,
        rng: &mut R,
    ) -> MatchOutcome {
        let trace = self.explain(utterance);
        let shortlist = self.rank_trace(&trace, state);
        if shortlist.is_empty() {
            debug!(
                stems = trace.stems.len(),
                query = trace.query.len(),
                "no record has lexical evidence"
            );
            return MatchOutcome::NoMatch;
        }

        let chosen = self.draw(&shortlist, rng);
        let candidate = &shortlist[chosen];
        let Some(record) = self.index.get(candidate.id.as_str()) else {
            warn!(id = %candidate.id, "ranked record missing from index");
            return MatchOutcome::NoMatch;
        };

        debug!(
            stems = trace.stems.len(),
            candidates = shortlist.len(),
            chosen = %record.id,
            rank = chosen,
            score = candidate.score,
            "response selected"
        );

        state.push(record.id.clone(), record.category);

        let ctx = TemplateContext::from_utterance(utterance);
        MatchOutcome::Selected(SelectionResult {
            id: record.id.clone(),
            category: record.category,
            body: render(&record.body, &ctx),
            follow_up: record.follow_up.as_deref().map(|f| render(f, &ctx)),
            intensity: record.intensity,
            shortlist,
        })
    }

    /// Index into `shortlist` of the drawn candidate.
    fn draw<R: Rng + ?Sized>(&self, shortlist: &[RankedCandidate], rng: &mut R) -> usize {
        match self.config.strategy {
            SelectionStrategy::Greedy => 0,
            SelectionStrategy::Weighted => {
                match WeightedIndex::new(shortlist.iter().map(|c| c.score)) {
                    Ok(dist) => dist.sample(rng),
                    Err(e) => {
                        warn!(error = %e, "invalid selection weights, taking rank 1");
                        0
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TextConfig;
    use crate::synonyms::SynonymSource;
    use crate::types::RawRecord;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn raw(id: &str, category: &str, keywords: &[&str], body: &str) -> RawRecord {
        RawRecord {
            id: id.to_string(),
            category: category.to_string(),
            keywords: keywords.iter().map(ToString::to_string).collect(),
            body: body.to_string(),
            follow_up: None,
            intensity: 5,
        }
    }

    fn engine(records: Vec<RawRecord>, config: MatchingConfig) -> MatchingEngine {
        let synonyms = SynonymSource::from_toml("[synonyms]\nbike = [\"cycling\"]").expect("toml");
        let index = CorpusIndex::build(records, &synonyms, &TextConfig::default()).expect("valid");
        MatchingEngine::new(Arc::new(index), config)
    }

    #[test]
    fn explain_expands_synonyms() {
        let engine = engine(
            vec![raw("a", "cycling", &["cycling"], "Ride on.")],
            MatchingConfig::default(),
        );
        let trace = engine.explain("my bike");
        assert_eq!(trace.stems, vec!["my", "bik"]);
        assert!(trace.query.contains("bik"));
        assert!(trace.query.contains("cycl"));
    }

    #[test]
    fn phrase_match_earns_bonus() {
        let engine = engine(
            vec![
                raw("ml", "machine_learning", &["machine learning"], "Gradient descent."),
                raw("mach", "work", &["machine"], "Cogs."),
            ],
            MatchingConfig::default(),
        );
        let ranked = engine.rank("I do machine learning", &ConversationState::default());
        let ml = ranked.iter().find(|c| c.id.as_str() == "ml").expect("ranked");
        assert!((ml.phrase_bonus - 1.0).abs() < f64::EPSILON);
        assert_eq!(ranked[0].id.as_str(), "ml");
    }

    #[test]
    fn greedy_always_takes_rank_one() {
        let config = MatchingConfig {
            strategy: SelectionStrategy::Greedy,
            ..MatchingConfig::default()
        };
        let engine = engine(
            vec![
                raw("a", "food", &["lunch", "coffee"], "A"),
                raw("b", "food", &["lunch"], "B"),
            ],
            config,
        );
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = ConversationState::default();
        let outcome = engine.match_utterance("lunch and coffee", &mut state, &mut rng);
        assert_eq!(outcome.selection().map(|s| s.id.as_str()), Some("a"));
    }

    #[test]
    fn templates_are_rendered_against_the_utterance() {
        let mut record = raw("a", "cycling", &["bike"], "A {user_phrase}? I own four.");
        record.follow_up = Some("You said: {user_input}".into());
        let engine = engine(vec![record], MatchingConfig::default());
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = engine.new_state();

        let outcome = engine.match_utterance("nice bike", &mut state, &mut rng);
        let selection = outcome.selection().expect("selected");
        assert_eq!(selection.body, "A nice bike? I own four.");
        assert_eq!(selection.follow_up.as_deref(), Some("You said: nice bike"));
        assert_eq!(state.position_of("a"), Some(0));
    }

    #[test]
    fn ties_break_by_id() {
        let engine = engine(
            vec![
                raw("z", "food", &["lunch"], "Z"),
                raw("m", "food", &["lunch"], "M"),
                raw("a", "food", &["lunch"], "A"),
            ],
            MatchingConfig::default(),
        );
        let ids: Vec<String> = engine
            .rank("lunch", &ConversationState::default())
            .into_iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }

    #[test]
    fn top_k_limits_shortlist() {
        let config = MatchingConfig {
            top_k: 2,
            ..MatchingConfig::default()
        };
        let records = (0..6)
            .map(|i| raw(&format!("r{i}"), "food", &["lunch"], "x"))
            .collect();
        let engine = engine(records, config);
        assert_eq!(engine.rank("lunch", &ConversationState::default()).len(), 2);
    }

    fn candidate(id: &str, score: f64) -> RankedCandidate {
        RankedCandidate {
            id: id.into(),
            category: Category::Food,
            overlap: 1,
            raw_score: score,
            phrase_bonus: 0.0,
            recency: 1.0,
            diversity: 1.0,
            score,
        }
    }

    #[test]
    fn weighted_draw_follows_score_ratio() {
        let engine = engine(
            vec![raw("a", "food", &["lunch"], "A")],
            MatchingConfig::default(),
        );
        let shortlist = vec![candidate("a", 3.0), candidate("b", 1.0)];
        let mut rng = StdRng::seed_from_u64(2024);

        let draws = 10_000;
        let firsts = (0..draws)
            .filter(|_| engine.draw(&shortlist, &mut rng) == 0)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let share = firsts as f64 / f64::from(draws);
        assert!((share - 0.75).abs() < 0.02, "rank 1 drawn {share} of the time");
    }

    #[test]
    fn boundary_ties_keep_lowest_ids_and_never_draw_below_the_cut() {
        let records = (0..6)
            .map(|i| raw(&format!("r{i}"), "food", &["lunch"], "x"))
            .collect();
        let engine = engine(records, MatchingConfig::default());

        let ids: Vec<String> = engine
            .rank("lunch", &ConversationState::default())
            .into_iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(ids, vec!["r0", "r1", "r2", "r3", "r4"]);

        let mut drawn = BTreeSet::new();
        for seed in 0..500 {
            let mut state = engine.new_state();
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = engine.match_utterance("lunch", &mut state, &mut rng);
            let id = outcome.selection().expect("selected").id.0.clone();
            assert_ne!(id, "r5", "seed {seed} drew below the top-K cut");
            drawn.insert(id);
        }
        assert_eq!(drawn.len(), 5, "every shortlisted record gets drawn: {drawn:?}");
    }

    #[test]
    fn no_match_leaves_state_untouched() {
        let engine = engine(
            vec![raw("a", "food", &["lunch"], "A")],
            MatchingConfig::default(),
        );
        let mut state = engine.new_state();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(engine.match_utterance("   ", &mut state, &mut rng).is_no_match());
        assert!(engine.match_utterance("quantum chromodynamics", &mut state, &mut rng).is_no_match());
        assert!(state.is_empty());
    }
}
