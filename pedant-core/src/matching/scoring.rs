//! Per-stage scoring functions for the matching engine.
//!
//! score = (Σ IDF(k) over matched k + phrase_bonus) × Recency(p) × Diversity(c)
//!
//! Where:
//!   Recency(p)   = 1 - max_penalty · exp(-decay_rate · p)   (p = 0 is the last reply)
//!   Diversity(c) = penalty if c ≥ saturation, boost if c = 0, else 1

use std::collections::{BTreeSet, HashMap};

use crate::config::{DiversityConfig, RecencyConfig};
use crate::corpus::CorpusIndex;

/// Lexical evidence gathered for one record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Evidence {
    /// Number of query keywords the record carries.
    pub overlap: usize,
    /// Sum of the IDF weights of those keywords.
    pub raw_score: f64,
    /// Whether one of the record's multi-word keywords was found in the utterance.
    pub phrase_hit: bool,
}

/// Walk the postings of every query keyword and accumulate evidence per
/// record index. Records without evidence are absent from the map.
pub(crate) fn gather_evidence(
    index: &CorpusIndex,
    query: &BTreeSet<String>,
    phrases: &BTreeSet<String>,
) -> HashMap<usize, Evidence> {
    let mut evidence: HashMap<usize, Evidence> = HashMap::new();
    for keyword in query {
        let Some(weight) = index.idf(keyword) else {
            continue;
        };
        let is_phrase = phrases.contains(keyword);
        for &record in index.postings(keyword) {
            let e = evidence.entry(record).or_default();
            e.overlap += 1;
            e.raw_score += weight;
            e.phrase_hit |= is_phrase;
        }
    }
    evidence
}

/// Multiplier for a record last chosen `position` turns ago, or 1.0 if it is
/// not in the recent window.
#[must_use]
pub fn recency_factor(position: Option<usize>, config: &RecencyConfig) -> f64 {
    match position {
        Some(p) => {
            #[allow(clippy::cast_precision_loss)]
            let p = p as f64;
            1.0 - config.max_penalty * (-config.decay_rate * p).exp()
        }
        None => 1.0,
    }
}

/// Multiplier for a category seen `count` times in the recent-category window.
#[must_use]
pub fn diversity_factor(count: usize, config: &DiversityConfig) -> f64 {
    if count == 0 {
        config.boost
    } else if count >= config.saturation_threshold {
        config.penalty
    } else {
        1.0
    }
}
