//! Persona prompt templates.
//!
//! The character profile is the system prompt; the user prompt carries the
//! matched corpus context, a suggested sass level and the utterance.

/// Minimal profile used when no character profile file is configured.
pub const DEFAULT_CHARACTER_PROFILE: &str = r#"You are {persona_name}, a PhD candidate in molecular machine learning.
You are pedantic, obsessively correct and you open far too many sentences with "Actually".
You track everything with metrics: watts, grams, minutes, citations.
You cite papers, some real and some suspiciously convenient (Wright et al., Knowitall et al.).
You do not realise how pedantic you sound."#;

/// User prompt for an in-persona reply.
pub const PERSONA_USER: &str = r"You are {persona_name}. Use the character profile you have been given.

INSTRUCTIONS:
1. Use the matched response context strongly; it is highly relevant to the input.
2. Vary your openings; do not always start with 'Actually'.
3. Balance topics; you have more than one obsession.
4. Quantify precisely: exact numbers, percentages, units.
5. Stay in character. Never mention that you are a model.

MATCHED RESPONSE CONTEXT:
Topics: {topics}
Suggested sass level: {intensity}/10 (adjust upward if warranted)

Relevant responses from your knowledge base:
{context}

USER INPUT: {user_input}

Reply in 1-3 sentences as {persona_name}:";

/// Bodies longer than this are cut before being sent as context.
const CONTEXT_BODY_CHARS: usize = 100;

/// At most this many topics are listed.
const MAX_TOPICS: usize = 5;

/// Keywords taken from each candidate when listing topics.
const KEYWORDS_PER_CANDIDATE: usize = 3;

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value; unknown keys are left as-is.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// One shortlisted corpus record, as context for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSnippet {
    /// Rendered body.
    pub body: String,
    /// Category tag.
    pub category: String,
    /// Keywords as written in the corpus.
    pub keywords: Vec<String>,
}

/// A rendered system + user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaPrompt {
    /// Character profile.
    pub system: String,
    /// Context, instructions and the utterance.
    pub user: String,
}

impl PersonaPrompt {
    /// Render the persona prompt.
    ///
    /// `profile` replaces [`DEFAULT_CHARACTER_PROFILE`] when given. Only the
    /// first `max_candidates` snippets are used.
    #[must_use]
    pub fn build(
        persona_name: &str,
        profile: Option<&str>,
        utterance: &str,
        candidates: &[CandidateSnippet],
        intensity: u8,
        max_candidates: usize,
    ) -> Self {
        let used = &candidates[..candidates.len().min(max_candidates)];
        let context = format_context(used);
        let topics = format_topics(used);
        let intensity = intensity.to_string();

        let vars = [
            ("persona_name", persona_name),
            ("topics", topics.as_str()),
            ("intensity", intensity.as_str()),
            ("context", context.as_str()),
            ("user_input", utterance.trim()),
        ];

        Self {
            system: render_template(profile.unwrap_or(DEFAULT_CHARACTER_PROFILE), &vars),
            user: render_template(PERSONA_USER, &vars),
        }
    }
}

fn format_context(candidates: &[CandidateSnippet]) -> String {
    if candidates.is_empty() {
        return "  (No specific context)".to_string();
    }
    candidates
        .iter()
        .map(|c| format!("  - {}", truncate(&c.body, CONTEXT_BODY_CHARS)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Categories and leading keywords, first-seen order, deduplicated.
fn format_topics(candidates: &[CandidateSnippet]) -> String {
    let mut topics: Vec<&str> = Vec::new();
    for candidate in candidates {
        let keywords = candidate
            .keywords
            .iter()
            .take(KEYWORDS_PER_CANDIDATE)
            .map(String::as_str);
        for topic in std::iter::once(candidate.category.as_str()).chain(keywords) {
            if !topic.is_empty() && !topics.contains(&topic) {
                topics.push(topic);
            }
        }
    }
    topics.truncate(MAX_TOPICS);
    if topics.is_empty() {
        "general".to_string()
    } else {
        topics.join(", ")
    }
}

/// Cut to `max_chars` characters, marking the cut with "...".
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
