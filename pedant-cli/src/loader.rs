//! Corpus loading.
//!
//! A corpus is either one JSON file holding every record, or a directory with
//! an `index.json` that names one file per record group:
//!
//! ```text
//! responses_by_category/
//! ├── index.json        { "groups": { "cycling": { "file": "cycling.json" } },
//! │                       "fallback_responses": [...], "meta_responses": {...} }
//! ├── cycling.json      { "responses": [ {...}, ... ] }
//! └── ...
//! ```
//!
//! Group files are read in group-name order so the record sequence handed to
//! the index never depends on JSON object ordering.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pedant_core::{CorpusIndex, Intensity, MatchingEngine, PedantConfig, RawRecord, SynonymSource};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// Name of the group listing inside a corpus directory.
pub const INDEX_FILE: &str = "index.json";

// ---------------------------------------------------------------------------
// Loaded data
// ---------------------------------------------------------------------------

/// A reply used when nothing in the corpus matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackResponse {
    /// Reply text.
    pub text: String,
    /// Sass level shown with it.
    pub intensity: Intensity,
}

/// Session bookends and the confusion line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetaResponses {
    /// Printed when a session starts.
    #[serde(default)]
    pub greeting: Option<String>,
    /// Printed when a session ends.
    #[serde(default)]
    pub goodbye: Option<String>,
    /// Used for unmatched turns when no fallback responses exist.
    #[serde(default)]
    pub confusion: Option<String>,
}

/// Replies that do not come from matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CannedResponses {
    /// Drawn at random on `NoMatch`.
    pub fallbacks: Vec<FallbackResponse>,
    /// Greeting, goodbye, confusion.
    pub meta: MetaResponses,
}

/// Everything read from a corpus path.
#[derive(Debug, Clone, Default)]
pub struct ResponseLibrary {
    /// Unvalidated records, in load order.
    pub records: Vec<RawRecord>,
    /// Fallback and meta replies.
    pub canned: CannedResponses,
}

// ---------------------------------------------------------------------------
// On-disk formats
// ---------------------------------------------------------------------------

/// Fallbacks may be bare strings or `{ "response": ..., "sass_level": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FallbackEntry {
    Text(String),
    Detailed {
        #[serde(alias = "body")]
        response: String,
        #[serde(default, alias = "intensity")]
        sass_level: Option<i64>,
    },
}

impl FallbackEntry {
    fn into_response(self) -> FallbackResponse {
        match self {
            Self::Text(text) => FallbackResponse {
                text,
                intensity: Intensity::NEUTRAL,
            },
            Self::Detailed {
                response,
                sass_level,
            } => {
                let intensity = match sass_level {
                    None => Intensity::NEUTRAL,
                    Some(raw) => Intensity::new(raw).unwrap_or_else(|| {
                        warn!(sass_level = raw, "fallback sass level out of range, using neutral");
                        Intensity::NEUTRAL
                    }),
                };
                FallbackResponse {
                    text: response,
                    intensity,
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CorpusFile {
    responses: Vec<RawRecord>,
    #[serde(default)]
    fallback_responses: Vec<FallbackEntry>,
    #[serde(default)]
    meta_responses: MetaResponses,
}

#[derive(Debug, Deserialize)]
struct IndexFile {
    groups: BTreeMap<String, GroupEntry>,
    #[serde(default)]
    fallback_responses: Vec<FallbackEntry>,
    #[serde(default)]
    meta_responses: MetaResponses,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    file: String,
}

#[derive(Debug, Deserialize)]
struct GroupFile {
    responses: Vec<RawRecord>,
}

fn canned(fallbacks: Vec<FallbackEntry>, meta: MetaResponses) -> CannedResponses {
    CannedResponses {
        fallbacks: fallbacks
            .into_iter()
            .map(FallbackEntry::into_response)
            .collect(),
        meta,
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a corpus from a JSON file or a group directory.
///
/// # Errors
/// Any unreadable or malformed file fails the whole load, naming the file.
pub fn load_library(path: &Path) -> Result<ResponseLibrary> {
    let library = if path.is_dir() {
        load_directory(path)?
    } else {
        load_file(path)?
    };
    info!(
        path = %path.display(),
        records = library.records.len(),
        fallbacks = library.canned.fallbacks.len(),
        "corpus loaded"
    );
    Ok(library)
}

fn load_file(path: &Path) -> Result<ResponseLibrary> {
    let file: CorpusFile = read_json(path)?;
    Ok(ResponseLibrary {
        records: file.responses,
        canned: canned(file.fallback_responses, file.meta_responses),
    })
}

fn load_directory(dir: &Path) -> Result<ResponseLibrary> {
    let index: IndexFile = read_json(&dir.join(INDEX_FILE))?;
    let mut records = Vec::new();
    for (group, entry) in &index.groups {
        let group_file: GroupFile = read_json(&dir.join(&entry.file))
            .with_context(|| format!("in record group '{group}'"))?;
        debug!(group, file = %entry.file, records = group_file.responses.len(), "group loaded");
        records.extend(group_file.responses);
    }
    Ok(ResponseLibrary {
        records,
        canned: canned(index.fallback_responses, index.meta_responses),
    })
}

/// Load the synonym table, or the built-in one when no path is configured.
///
/// # Errors
/// Fails if the configured file cannot be read or parsed.
pub fn load_synonyms(path: Option<&Path>) -> Result<SynonymSource> {
    match path {
        Some(path) => SynonymSource::from_file(path)
            .with_context(|| format!("failed to load synonyms from {}", path.display())),
        None => Ok(SynonymSource::builtin()),
    }
}

/// Read the character profile used as the generation system prompt.
///
/// # Errors
/// Fails if the configured file cannot be read.
pub fn load_profile(path: Option<&Path>) -> Result<Option<String>> {
    path.map(|path| {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read character profile {}", path.display()))
    })
    .transpose()
}

/// Load, validate and index the configured corpus.
///
/// # Errors
/// Fails on unreadable files or on the first invalid record.
pub fn build_engine(config: &PedantConfig) -> Result<(MatchingEngine, CannedResponses)> {
    let library = load_library(Path::new(&config.corpus.path))?;
    let synonyms = load_synonyms(config.corpus.synonyms_path.as_deref().map(Path::new))?;
    let index = CorpusIndex::build(library.records, &synonyms, &config.text)
        .with_context(|| format!("invalid corpus at {}", config.corpus.path))?;
    let engine = MatchingEngine::new(Arc::new(index), config.matching.clone());
    Ok((engine, library.canned))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).expect("write fixture");
    }

    #[test]
    fn directory_groups_load_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            INDEX_FILE,
            r#"{
                "groups": {
                    "work": { "file": "work.json", "description": "jobs" },
                    "cycling": { "file": "cycling.json" }
                },
                "fallback_responses": ["Hmm.", { "response": "Cite a source.", "sass_level": 8 }],
                "meta_responses": { "greeting": "Hello.", "goodbye": "Bye." }
            }"#,
        );
        write(
            dir.path(),
            "work.json",
            r#"{ "responses": [ { "id": "w1", "category": "work", "keywords": ["job"], "response": "Jobs." } ] }"#,
        );
        write(
            dir.path(),
            "cycling.json",
            r#"{ "responses": [ { "id": "c1", "category": "cycling", "keywords": ["bike"], "body": "Bikes.", "sass_level": 9 } ] }"#,
        );

        let library = load_library(dir.path()).expect("loads");
        let ids: Vec<&str> = library.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["c1", "w1"]);
        assert_eq!(library.records[0].intensity, 9);
        assert_eq!(library.records[1].intensity, 5);

        assert_eq!(library.canned.fallbacks.len(), 2);
        assert_eq!(library.canned.fallbacks[0].intensity, Intensity::NEUTRAL);
        assert_eq!(library.canned.fallbacks[1].intensity.value(), 8);
        assert_eq!(library.canned.meta.greeting.as_deref(), Some("Hello."));
        assert!(library.canned.meta.confusion.is_none());
    }

    #[test]
    fn single_file_corpus_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "responses.json",
            r#"{ "responses": [ { "id": "a", "category": "food", "keywords": ["lunch"], "response": "12:07.", "follow_up": "Sharp." } ] }"#,
        );
        let library = load_library(&dir.path().join("responses.json")).expect("loads");
        assert_eq!(library.records.len(), 1);
        assert_eq!(library.records[0].follow_up.as_deref(), Some("Sharp."));
        assert!(library.canned.fallbacks.is_empty());
    }

    #[test]
    fn missing_group_file_names_the_group() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            INDEX_FILE,
            r#"{ "groups": { "food": { "file": "food.json" } } }"#,
        );
        let err = load_library(dir.path()).expect_err("food.json is missing");
        let chain = format!("{err:#}");
        assert!(chain.contains("food"), "{chain}");
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "bad.json", "{ not json");
        assert!(load_library(&dir.path().join("bad.json")).is_err());
    }

    #[test]
    fn out_of_range_fallback_level_becomes_neutral() {
        let entry = FallbackEntry::Detailed {
            response: "x".into(),
            sass_level: Some(42),
        };
        assert_eq!(entry.into_response().intensity, Intensity::NEUTRAL);
    }

    #[test]
    fn synonyms_and_profile_are_optional() {
        assert!(!load_synonyms(None).expect("builtin").is_empty());
        assert!(load_profile(None).expect("no profile").is_none());

        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "profile.md", "You are {persona_name}.");
        let profile = load_profile(Some(&dir.path().join("profile.md"))).expect("reads");
        assert_eq!(profile.as_deref(), Some("You are {persona_name}."));
        assert!(load_synonyms(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
