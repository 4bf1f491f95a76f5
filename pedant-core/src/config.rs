//! Configuration for the Pedant response engine.
//!
//! Maps directly to `pedant.toml`. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PedantError, Result};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(Default)]
pub struct PedantConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Ranking and selection tuning.
    #[serde(default)]
    pub matching: MatchingConfig,
    /// Tokenizer and stemmer rules.
    #[serde(default)]
    pub text: TextConfig,
    /// Where the corpus, synonyms and persona profile live.
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// Optional generative delegation.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Per-session behavior of the front end.
    #[serde(default)]
    pub session: SessionConfig,
}

impl PedantConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `PedantError::Config` if the TOML is invalid or a value is out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| PedantError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject values the engine cannot work with.
    ///
    /// # Errors
    /// Returns `PedantError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let m = &self.matching;
        if m.top_k == 0 {
            return Err(config_err("matching.top_k must be at least 1"));
        }
        if !(m.phrase_bonus >= 0.0) {
            return Err(config_err("matching.phrase_bonus must be non-negative"));
        }
        if !(0.0..=1.0).contains(&m.recency.max_penalty) {
            return Err(config_err("matching.recency.max_penalty must be within [0, 1]"));
        }
        if !(m.recency.decay_rate >= 0.0) {
            return Err(config_err("matching.recency.decay_rate must be non-negative"));
        }
        if !(m.diversity.penalty > 0.0) || !(m.diversity.boost > 0.0) {
            return Err(config_err("matching.diversity multipliers must be positive"));
        }
        if let Some(weakest) = m.recency.weakest_factor() {
            let bound = m.diversity.penalty / m.diversity.boost;
            if weakest >= bound {
                return Err(PedantError::Config(format!(
                    "matching.recency penalty fades to {weakest:.3} inside the window; \
                     it must stay below diversity.penalty / diversity.boost = {bound:.3}"
                )));
            }
        }
        if self.text.min_stem_len == 0 {
            return Err(config_err("text.min_stem_len must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.session.follow_up_probability) {
            return Err(config_err("session.follow_up_probability must be within [0, 1]"));
        }
        Ok(())
    }
}

fn config_err(msg: &str) -> PedantError {
    PedantError::Config(msg.to_string())
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Name printed in front of persona replies.
    #[serde(default = "default_persona_name")]
    pub persona_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            persona_name: default_persona_name(),
        }
    }
}

/// How the final record is drawn from the shortlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum SelectionStrategy {
    /// Random draw among the top-K, proportional to adjusted score.
    #[default]
    Weighted,
    /// Always the rank-1 candidate.
    Greedy,
}

/// Ranking and selection tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Shortlist size for the final draw.
    #[serde(default = "default_5_usize")]
    pub top_k: usize,
    /// Added once to a record's score when one of its multi-word keywords
    /// appears contiguously in the utterance.
    #[serde(default = "default_1_0")]
    pub phrase_bonus: f64,
    /// Draw strategy.
    #[serde(default)]
    pub strategy: SelectionStrategy,
    /// Penalty for recently chosen records.
    #[serde(default)]
    pub recency: RecencyConfig,
    /// Topic-diversity multipliers.
    #[serde(default)]
    pub diversity: DiversityConfig,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            phrase_bonus: 1.0,
            strategy: SelectionStrategy::Weighted,
            recency: RecencyConfig::default(),
            diversity: DiversityConfig::default(),
        }
    }
}

/// Recency penalty: `factor = 1 - max_penalty * exp(-decay_rate * p)`.
///
/// The factor at the oldest remembered position must stay below
/// `diversity.penalty / diversity.boost`, otherwise a recent record can
/// outrank an equal-scoring record from a saturated topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecencyConfig {
    /// How many recent record ids are remembered.
    #[serde(default = "default_5_usize")]
    pub window: usize,
    /// Penalty applied to the most recent record (position 0).
    #[serde(default = "default_0_8")]
    pub max_penalty: f64,
    /// How fast the penalty fades with position.
    #[serde(default = "default_0_15")]
    pub decay_rate: f64,
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self {
            window: 5,
            max_penalty: 0.8,
            decay_rate: 0.15,
        }
    }
}

impl RecencyConfig {
    /// Factor applied to the oldest id still in the window, or `None` when
    /// the window is empty.
    #[must_use]
    pub fn weakest_factor(&self) -> Option<f64> {
        let oldest = self.window.checked_sub(1)?;
        #[allow(clippy::cast_precision_loss)]
        let p = oldest as f64;
        Some(1.0 - self.max_penalty * (-self.decay_rate * p).exp())
    }
}

/// Topic diversity: penalize saturated categories, boost unseen ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversityConfig {
    /// How many recent categories are remembered.
    #[serde(default = "default_5_usize")]
    pub window: usize,
    /// Occurrence count at which a category counts as saturated.
    #[serde(default = "default_3_usize")]
    pub saturation_threshold: usize,
    /// Multiplier for saturated categories.
    #[serde(default = "default_0_7")]
    pub penalty: f64,
    /// Multiplier for categories absent from the window.
    #[serde(default = "default_1_2")]
    pub boost: f64,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            window: 5,
            saturation_threshold: 3,
            penalty: 0.7,
            boost: 1.2,
        }
    }
}

/// Tokenizer and stemmer rules. Applied identically to corpus keywords,
/// synonym entries and utterances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Tokens shorter than this are dropped.
    #[serde(default = "default_2_usize")]
    pub min_token_len: usize,
    /// Short tokens kept regardless of length.
    #[serde(default = "default_allow_list")]
    pub short_token_allow_list: Vec<String>,
    /// Suffixes tried in order; the first one that leaves a long enough stem wins.
    #[serde(default = "default_suffixes")]
    pub stem_suffixes: Vec<String>,
    /// Shortest stem a suffix strip may leave behind.
    #[serde(default = "default_3_usize")]
    pub min_stem_len: usize,
    /// Words shorter than this are never stemmed.
    #[serde(default = "default_4_usize")]
    pub min_stemmable_len: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            min_token_len: 2,
            short_token_allow_list: default_allow_list(),
            stem_suffixes: default_suffixes(),
            min_stem_len: 3,
            min_stemmable_len: 4,
        }
    }
}

/// Corpus source locations. Interpreted by the front end, not the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// A `responses.json` file or a directory holding `index.json`.
    #[serde(default = "default_corpus_path")]
    pub path: String,
    /// Optional TOML synonym table; the built-in table is used when absent.
    #[serde(default)]
    pub synonyms_path: Option<String>,
    /// Optional character profile used as the LLM system prompt.
    #[serde(default)]
    pub profile_path: Option<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
            synonyms_path: None,
            profile_path: None,
        }
    }
}

/// Generative delegation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether to try delegation at all.
    #[serde(default)]
    pub enabled: bool,
    /// Provider: "ollama", "openai", "none".
    #[serde(default = "default_ollama")]
    pub provider: String,
    /// Base URL for the LLM API.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key (OpenAI-compatible only).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Hard timeout for a generation call in milliseconds.
    #[serde(default = "default_30000")]
    pub request_timeout_ms: u64,
    /// Timeout for the startup health check in milliseconds.
    #[serde(default = "default_2000")]
    pub health_timeout_ms: u64,
    /// Retries after the first failed attempt.
    #[serde(default = "default_1_u32")]
    pub max_retries: u32,
    /// Sampling temperature.
    #[serde(default = "default_0_8_f32")]
    pub temperature: f32,
    /// Maximum tokens to generate.
    #[serde(default = "default_200")]
    pub max_tokens: u32,
    /// How many shortlisted bodies are sent as context.
    #[serde(default = "default_3_usize")]
    pub context_candidates: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_ollama(),
            base_url: default_ollama_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            request_timeout_ms: 30_000,
            health_timeout_ms: 2_000,
            max_retries: 1,
            temperature: 0.8,
            max_tokens: 200,
            context_candidates: 3,
        }
    }
}

/// Front-end session behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Chance that a record's follow-up is shown after its body.
    #[serde(default = "default_0_5")]
    pub follow_up_probability: f64,
    /// Fixed RNG seed; a random seed is used when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Turns shown by `/history`.
    #[serde(default = "default_5_usize")]
    pub history_display: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            follow_up_probability: 0.5,
            seed: None,
            history_display: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "warn".to_string() }
fn default_persona_name() -> String { "Pedant".to_string() }
fn default_corpus_path() -> String { "data/responses_by_category".to_string() }
fn default_ollama() -> String { "ollama".to_string() }
fn default_ollama_url() -> String { "http://localhost:11434".to_string() }
fn default_model() -> String { "llama3.2:3b".to_string() }
fn default_api_key_env() -> String { "OPENAI_API_KEY".to_string() }
fn default_allow_list() -> Vec<String> { vec!["c".to_string(), "r".to_string()] }
fn default_suffixes() -> Vec<String> {
    ["ings", "ing", "ies", "ied", "ed", "es", "s", "ly", "er", "est", "e"]
        .iter()
        .map(ToString::to_string)
        .collect()
}
fn default_0_15() -> f64 { 0.15 }
fn default_0_5() -> f64 { 0.5 }
fn default_0_7() -> f64 { 0.7 }
fn default_0_8() -> f64 { 0.8 }
fn default_0_8_f32() -> f32 { 0.8 }
fn default_1_0() -> f64 { 1.0 }
fn default_1_2() -> f64 { 1.2 }
fn default_1_u32() -> u32 { 1 }
fn default_2_usize() -> usize { 2 }
fn default_3_usize() -> usize { 3 }
fn default_4_usize() -> usize { 4 }
fn default_5_usize() -> usize { 5 }
fn default_200() -> u32 { 200 }
fn default_2000() -> u64 { 2000 }
fn default_30000() -> u64 { 30_000 }
