//! Tokenization, suffix-stripping stemmer and key-phrase extraction.
//!
//! The same [`Normalizer`] is used for corpus keywords, synonym entries and
//! utterances, so every comparison happens between stems.

use std::collections::HashSet;

use crate::config::TextConfig;

/// Lowercasing tokenizer plus suffix-stripping stemmer.
#[derive(Debug, Clone)]
pub struct Normalizer {
    min_token_len: usize,
    allow_list: HashSet<String>,
    suffixes: Vec<String>,
    min_stem_len: usize,
    min_stemmable_len: usize,
}

impl Normalizer {
    /// Build a normalizer from text rules.
    #[must_use]
    pub fn new(config: &TextConfig) -> Self {
        Self {
            min_token_len: config.min_token_len,
            allow_list: config
                .short_token_allow_list
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            suffixes: config.stem_suffixes.iter().map(|s| s.to_lowercase()).collect(),
            min_stem_len: config.min_stem_len,
            min_stemmable_len: config.min_stemmable_len,
        }
    }

    /// Lowercase and split on non-alphanumeric boundaries, dropping tokens
    /// shorter than the minimum unless allow-listed.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .filter(|t| t.chars().count() >= self.min_token_len || self.allow_list.contains(*t))
            .map(str::to_string)
            .collect()
    }

    /// Strip the first configured suffix that leaves a long enough stem.
    #[must_use]
    pub fn stem(&self, word: &str) -> String {
        if word.chars().count() < self.min_stemmable_len {
            return word.to_string();
        }
        for suffix in &self.suffixes {
            if let Some(stem) = word.strip_suffix(suffix.as_str()) {
                if stem.chars().count() >= self.min_stem_len {
                    return stem.to_string();
                }
            }
        }
        word.to_string()
    }

    /// Tokenize then stem every token, preserving order.
    #[must_use]
    pub fn normalize(&self, text: &str) -> Vec<String> {
        self.tokenize(text).iter().map(|t| self.stem(t)).collect()
    }

    /// Canonical form of a keyword or phrase: stems joined by single spaces.
    ///
    /// Returns `None` when nothing indexable is left.
    #[must_use]
    pub fn canonical(&self, text: &str) -> Option<String> {
        let stems = self.normalize(text);
        if stems.is_empty() {
            None
        } else {
            Some(stems.join(" "))
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&TextConfig::default())
    }
}

/// Whether `phrase` (a sequence of stems) occurs contiguously in `stems`.
#[must_use]
pub fn contains_sequence(stems: &[String], phrase: &[&str]) -> bool {
    if phrase.is_empty() || phrase.len() > stems.len() {
        return false;
    }
    stems
        .windows(phrase.len())
        .any(|w| w.iter().zip(phrase).all(|(a, b)| a == b))
}

// ---------------------------------------------------------------------------
// Key phrase
// ---------------------------------------------------------------------------

/// Function words and conversational verbs that never count as noun-like.
const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "all", "also", "and", "any", "are", "because", "been",
    "before", "being", "but", "can", "could", "did", "does", "doing", "done", "for", "from",
    "get", "got", "had", "has", "have", "having", "her", "here", "hers", "him", "his", "how",
    "into", "its", "just", "know", "like", "make", "many", "may", "more", "most", "much",
    "must", "not", "now", "off", "once", "only", "other", "our", "ours", "out", "over",
    "really", "said", "say", "says", "see", "she", "should", "some", "such", "tell", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "think", "this",
    "those", "through", "too", "under", "until", "use", "used", "very", "want", "was",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "would", "yes", "yet", "you", "your", "yours",
];

fn is_noun_like(word: &str) -> bool {
    word.chars().count() >= 3
        && word.chars().all(char::is_alphabetic)
        && !STOPWORDS.contains(&word.to_lowercase().as_str())
}

/// The longest contiguous run of noun-like words in `utterance`, with the
/// original casing. Longer runs win by word count, then by characters; the
/// earliest run wins a full tie.
#[must_use]
pub fn key_phrase(utterance: &str) -> Option<String> {
    let mut best: Option<PhraseRun<'_>> = None;
    let mut run: Vec<&str> = Vec::new();

    let words = utterance
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty());

    for word in words {
        if is_noun_like(word) {
            run.push(word);
        } else {
            close_run(&mut best, &mut run);
        }
    }
    close_run(&mut best, &mut run);

    best.map(|r| r.words.join(" "))
}

struct PhraseRun<'a> {
    words: Vec<&'a str>,
    chars: usize,
}

fn close_run<'a>(best: &mut Option<PhraseRun<'a>>, run: &mut Vec<&'a str>) {
    if run.is_empty() {
        return;
    }
    let chars = run.iter().map(|w| w.chars().count()).sum::<usize>();
    let better = best.as_ref().is_none_or(|b| {
        run.len() > b.words.len() || (run.len() == b.words.len() && chars > b.chars)
    });
    if better {
        *best = Some(PhraseRun {
            words: std::mem::take(run),
            chars,
        });
    } else {
        run.clear();
    }
}
