//! Persona Prompt Evaluation: Golden Test Set
//!
//! Curated utterance + shortlist inputs with strings the rendered prompt must
//! and must not contain.
//!
//! - **Offline eval:** `cargo test -p pedant-llm --test eval_golden` checks that
//!   templates render into well-formed prompts.
//! - **Online eval:** not automated; point `pedant` at a running Ollama and
//!   use `/why` to compare the shortlist with the generated reply.

use pedant_llm::prompt::{self, CandidateSnippet, PersonaPrompt};

/// A golden test case for prompt evaluation.
struct GoldenCase {
    /// Human-readable name for the test case.
    name: &'static str,
    /// Utterance as typed.
    utterance: &'static str,
    /// Shortlisted records (body, category, keywords).
    candidates: Vec<(&'static str, &'static str, Vec<&'static str>)>,
    /// Suggested sass level.
    intensity: u8,
    /// Strings that MUST appear in the rendered user prompt.
    prompt_must_contain: Vec<&'static str>,
    /// Strings that MUST NOT appear in the rendered user prompt.
    prompt_must_not_contain: Vec<&'static str>,
}

fn golden_cases() -> Vec<GoldenCase> {
    vec![
        // ---------------------------------------------------------------
        // 1. Cycling brag
        // ---------------------------------------------------------------
        GoldenCase {
            name: "cycling_brag",
            utterance: "tell me about your bike",
            candidates: vec![
                ("My bike weighs 6.8 kg. The UCI minimum is 6.8 kg. Coincidence? No.", "cycling", vec!["bike", "weight", "uci"]),
                ("I rode 312 km last week at an average of 251 watts.", "cycling", vec!["ride", "watts"]),
            ],
            intensity: 8,
            prompt_must_contain: vec!["6.8 kg", "251 watts", "cycling, bike, weight, uci, ride", "8/10", "tell me about your bike"],
            prompt_must_not_contain: vec!["{context}", "{topics}", "{user_input}", "(No specific context)"],
        },
        // ---------------------------------------------------------------
        // 2. Research with a long body
        // ---------------------------------------------------------------
        GoldenCase {
            name: "research_long_body",
            utterance: "how is the thesis going?",
            candidates: vec![
                ("Chapter three is 94% done, which is statistically indistinguishable from done, as Wright et al. showed in a paper nobody else can find.", "academia", vec!["thesis", "phd"]),
            ],
            intensity: 6,
            prompt_must_contain: vec!["Chapter three is 94% done", "...", "academia, thesis, phd"],
            prompt_must_not_contain: vec!["nobody else can find", "{intensity}"],
        },
        // ---------------------------------------------------------------
        // 3. No shortlist at all
        // ---------------------------------------------------------------
        GoldenCase {
            name: "no_context",
            utterance: "what's your favourite colour",
            candidates: vec![],
            intensity: 5,
            prompt_must_contain: vec!["(No specific context)", "Topics: general", "5/10"],
            prompt_must_not_contain: vec!["{context}"],
        },
        // ---------------------------------------------------------------
        // 4. Machine learning
        // ---------------------------------------------------------------
        GoldenCase {
            name: "ml_hype",
            utterance: "is AI going to replace chemists?",
            candidates: vec![
                ("Actually, my model predicts binding affinity with an RMSE of 0.71 log units.", "machine_learning", vec!["ai", "model"]),
                ("Retrosynthesis is a graph search. I have opinions about the heuristic.", "chemistry", vec!["synthesis"]),
            ],
            intensity: 9,
            prompt_must_contain: vec!["RMSE of 0.71", "machine_learning", "chemistry", "9/10", "replace chemists"],
            prompt_must_not_contain: vec!["{persona_name}"],
        },
        // ---------------------------------------------------------------
        // 5. Food
        // ---------------------------------------------------------------
        GoldenCase {
            name: "lunch_macros",
            utterance: "  want to grab lunch?  ",
            candidates: vec![
                ("Lunch is at 12:07. Not 12:00. The queue data is unambiguous.", "food", vec!["lunch", "meal"]),
            ],
            intensity: 4,
            prompt_must_contain: vec!["12:07", "USER INPUT: want to grab lunch?", "food, lunch, meal"],
            prompt_must_not_contain: vec!["USER INPUT:   "],
        },
        // ---------------------------------------------------------------
        // 6. Personality, low sass
        // ---------------------------------------------------------------
        GoldenCase {
            name: "compliment_low_sass",
            utterance: "you're really smart",
            candidates: vec![
                ("I know. Well, I know to within a 95% confidence interval.", "personality", vec!["smart", "intelligent"]),
            ],
            intensity: 2,
            prompt_must_contain: vec!["95% confidence interval", "2/10", "personality, smart, intelligent"],
            prompt_must_not_contain: vec!["{topics}"],
        },
        // ---------------------------------------------------------------
        // 7. Topic cap
        // ---------------------------------------------------------------
        GoldenCase {
            name: "topic_cap",
            utterance: "how was your weekend",
            candidates: vec![
                ("Two rides, one paper, zero rest.", "lifestyle", vec!["weekend", "rest", "plans", "saturday"]),
                ("The gym was 14% emptier than last Sunday.", "fitness", vec!["gym"]),
                ("The plants survived. Mostly.", "lifestyle", vec!["plant"]),
            ],
            intensity: 5,
            prompt_must_contain: vec!["lifestyle, weekend, rest, plans, fitness", "zero rest", "14% emptier", "Mostly."],
            prompt_must_not_contain: vec!["saturday", "plant,"],
        },
        // ---------------------------------------------------------------
        // 8. Work
        // ---------------------------------------------------------------
        GoldenCase {
            name: "work_meeting",
            utterance: "long meeting today?",
            candidates: vec![
                ("Forty-seven minutes, of which nine were useful. I logged it.", "work", vec!["meeting", "job"]),
            ],
            intensity: 7,
            prompt_must_contain: vec!["Forty-seven minutes", "work, meeting, job", "long meeting today?"],
            prompt_must_not_contain: vec!["{user_input}"],
        },
        // ---------------------------------------------------------------
        // 9. Unicode in body and utterance
        // ---------------------------------------------------------------
        GoldenCase {
            name: "unicode_safe",
            utterance: "café or tea?",
            candidates: vec![
                ("Café crème at 68 °C. Above 70 °C the aromatics degrade, measurably.", "food", vec!["coffee", "café"]),
            ],
            intensity: 6,
            prompt_must_contain: vec!["68 °C", "food, coffee, café", "café or tea?"],
            prompt_must_not_contain: vec!["{context}"],
        },
        // ---------------------------------------------------------------
        // 10. Conversational greeting
        // ---------------------------------------------------------------
        GoldenCase {
            name: "greeting",
            utterance: "hello there",
            candidates: vec![
                ("Hello. You are 3 minutes later than statistically expected.", "conversational", vec!["hello", "hi"]),
            ],
            intensity: 3,
            prompt_must_contain: vec!["3 minutes later", "conversational, hello, hi", "3/10"],
            prompt_must_not_contain: vec!["{intensity}"],
        },
    ]
}

fn snippets(case: &GoldenCase) -> Vec<CandidateSnippet> {
    case.candidates
        .iter()
        .map(|(body, category, keywords)| CandidateSnippet {
            body: (*body).to_string(),
            category: (*category).to_string(),
            keywords: keywords.iter().map(ToString::to_string).collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Offline Tests: Template Rendering Validation
// ---------------------------------------------------------------------------

#[test]
fn golden_prompts_render_without_unresolved_vars() {
    for case in &golden_cases() {
        let prompt = PersonaPrompt::build("Pedant", None, case.utterance, &snippets(case), case.intensity, 3);
        let rendered = &prompt.user;

        for needle in &case.prompt_must_contain {
            assert!(
                rendered.contains(needle),
                "Golden case '{}': rendered prompt must contain '{}' but doesn't.\nRendered:\n{}",
                case.name,
                needle,
                rendered
            );
        }

        for needle in &case.prompt_must_not_contain {
            assert!(
                !rendered.contains(needle),
                "Golden case '{}': rendered prompt must NOT contain '{}' but does.\nRendered:\n{}",
                case.name,
                needle,
                rendered
            );
        }
    }
}

#[test]
fn golden_set_has_minimum_coverage() {
    let cases = golden_cases();
    assert!(
        cases.len() >= 10,
        "Golden set must have at least 10 test cases, got {}",
        cases.len()
    );
}

#[test]
fn custom_profile_replaces_default() {
    let profile = "You are {persona_name}. You measure everything twice.";
    let prompt = PersonaPrompt::build("Dr. Exact", Some(profile), "hi", &[], 5, 3);
    assert_eq!(prompt.system, "You are Dr. Exact. You measure everything twice.");
    assert!(!prompt.system.contains("molecular"));
}

#[test]
fn prompts_have_character_instruction() {
    for (name, template) in [
        ("profile", prompt::DEFAULT_CHARACTER_PROFILE),
        ("user", prompt::PERSONA_USER),
    ] {
        assert!(
            template.contains("You are {persona_name}"),
            "Prompt '{name}' must establish character identity"
        );
    }
}
