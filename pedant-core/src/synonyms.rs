//! Synonym expansion table.
//!
//! The table itself is curation data ([`SynonymSource`], usually a TOML
//! file). At index build time it is compiled against the corpus
//! [`Normalizer`] into a [`SynonymTable`] keyed by stems, which satisfies the
//! lookup contract `expand(word) -> canonical forms, including the word`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PedantError, Result};
use crate::text::Normalizer;

/// Raw synonym entries: surface word → related words or phrases.
///
/// TOML layout:
///
/// ```toml
/// [synonyms]
/// bike = ["bicycle", "cycling", "ride"]
/// ai = ["artificial intelligence", "machine learning"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynonymSource {
    /// Entries keyed by surface word.
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
}

impl SynonymSource {
    /// Parse a TOML synonym file.
    ///
    /// # Errors
    /// Returns `PedantError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| PedantError::Config(format!("synonyms: {e}")))
    }

    /// Read and parse a TOML synonym file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// The compiled-in default table.
    #[must_use]
    pub fn builtin() -> Self {
        let synonyms = BUILTIN
            .iter()
            .map(|(word, alts)| {
                (
                    (*word).to_string(),
                    alts.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();
        Self { synonyms }
    }

    /// Number of surface entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.synonyms.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty()
    }
}

/// Stem-keyed synonym table, compiled once per index.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    expansions: HashMap<String, BTreeSet<String>>,
}

impl SynonymTable {
    /// Compile raw entries with the same normalizer the corpus uses.
    ///
    /// Keys must be single words; a key that normalizes to several stems is
    /// skipped with a warning. Values may be phrases and are stored as
    /// space-joined stems. Keys sharing a stem are merged.
    #[must_use]
    pub fn compile(source: &SynonymSource, normalizer: &Normalizer) -> Self {
        let mut expansions: HashMap<String, BTreeSet<String>> = HashMap::new();

        for (word, alternatives) in &source.synonyms {
            let stems = normalizer.normalize(word);
            let [key] = stems.as_slice() else {
                warn!(key = %word, "synonym key must be a single word; entry skipped");
                continue;
            };
            let entry = expansions.entry(key.clone()).or_default();
            for alt in alternatives {
                match normalizer.canonical(alt) {
                    Some(canonical) if canonical != *key => {
                        entry.insert(canonical);
                    }
                    Some(_) => {}
                    None => warn!(key = %word, alternative = %alt, "synonym has no indexable tokens"),
                }
            }
        }

        expansions.retain(|_, alts| !alts.is_empty());
        Self { expansions }
    }

    /// Canonical forms for a stemmed word, always including the word itself.
    #[must_use]
    pub fn expand(&self, stem: &str) -> BTreeSet<String> {
        let mut forms = BTreeSet::new();
        forms.insert(stem.to_string());
        if let Some(alts) = self.expansions.get(stem) {
            forms.extend(alts.iter().cloned());
        }
        forms
    }

    /// Number of stems with at least one expansion.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expansions.len()
    }

    /// Whether the table expands nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expansions.is_empty()
    }
}

const BUILTIN: &[(&str, &[&str])] = &[
    // cycling / exercise
    ("bike", &["bicycle", "cycling", "cycle", "ride", "cyclist"]),
    ("bicycle", &["bike", "cycling"]),
    ("cycling", &["bike", "bicycle", "ride", "cyclist"]),
    ("ride", &["cycling", "bike", "bicycle"]),
    ("exercise", &["workout", "fitness", "train", "gym"]),
    ("run", &["running", "runner", "jog", "marathon"]),
    // intelligence
    ("smart", &["intelligent", "clever", "bright", "genius", "brilliant"]),
    ("stupid", &["dumb", "idiot", "foolish", "ignorant"]),
    ("intelligent", &["smart", "clever", "bright"]),
    ("know", &["knowledge", "understand", "comprehend", "aware"]),
    // academia
    ("phd", &["doctorate", "dissertation", "thesis", "doctoral"]),
    ("thesis", &["dissertation", "phd", "research"]),
    ("paper", &["publication", "manuscript", "article"]),
    ("research", &["study", "investigation", "analysis"]),
    // chemistry
    ("molecule", &["molecular", "compound", "chemical", "structure"]),
    ("molecular", &["molecule", "compound", "chemistry"]),
    ("drug", &["compound", "molecule", "pharmaceutical"]),
    ("synthesis", &["synthesize", "reaction", "chemical"]),
    // machine learning
    ("ai", &["artificial intelligence", "machine learning", "ml", "neural network"]),
    ("model", &["neural network", "algorithm", "ml"]),
    ("train", &["training", "learning", "optimization"]),
    // food
    ("food", &["eat", "meal", "nutrition", "diet"]),
    ("lunch", &["meal", "eat", "dinner", "breakfast"]),
    // work
    ("work", &["job", "research", "career", "employment"]),
    ("job", &["work", "position", "employment", "career"]),
    // personality
    ("pedantic", &["pedantry", "nitpick", "correct", "precise"]),
    ("correct", &["right", "accurate", "precise", "fix"]),
    ("wrong", &["incorrect", "mistake", "error", "false"]),
    // general
    ("good", &["great", "excellent", "nice", "wonderful"]),
    ("bad", &["terrible", "awful", "poor", "negative"]),
    ("think", &["believe", "consider", "opinion", "thought"]),
    ("say", &["tell", "speak", "talk", "mention"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(toml: &str) -> SynonymTable {
        let source = SynonymSource::from_toml(toml).expect("valid toml");
        SynonymTable::compile(&source, &Normalizer::default())
    }

    #[test]
    fn expand_includes_the_word_itself() {
        let table = SynonymTable::default();
        let forms = table.expand("plant");
        assert_eq!(forms.len(), 1);
        assert!(forms.contains("plant"));
    }

    #[test]
    fn keys_and_values_are_stemmed() {
        let table = compiled("[synonyms]\nbike = [\"cycling\", \"bicycles\"]");
        let forms = table.expand("bik");
        assert!(forms.contains("bik"));
        assert!(forms.contains("cycl"));
        assert!(forms.contains("bicycl"));
    }

    #[test]
    fn phrase_values_become_joined_stems() {
        let table = compiled("[synonyms]\nai = [\"machine learning\"]");
        assert!(table.expand("ai").contains("machin learn"));
    }

    #[test]
    fn keys_sharing_a_stem_merge() {
        let table = compiled("[synonyms]\ntrain = [\"gym\"]\ntraining = [\"workout\"]");
        let forms = table.expand("train");
        assert!(forms.contains("gym"));
        assert!(forms.contains("workout"));
    }

    #[test]
    fn multi_word_keys_are_skipped() {
        let table = compiled("[synonyms]\n\"peer review\" = [\"critique\"]");
        assert!(table.is_empty());
    }

    #[test]
    fn builtin_table_compiles() {
        let table = SynonymTable::compile(&SynonymSource::builtin(), &Normalizer::default());
        assert!(table.len() >= 25);
        assert!(table.expand("bik").contains("cycl"));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = SynonymSource::from_toml("[synonyms\nbike =").expect_err("invalid");
        assert!(matches!(err, PedantError::Config(_)));
    }
}
