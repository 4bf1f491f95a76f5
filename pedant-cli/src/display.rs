//! Text rendering for the REPL and `--stats`.
//!
//! Everything here returns a `String` so output can be checked in tests;
//! the REPL only prints.

use std::fmt::Write as _;

use pedant_core::{CorpusStats, Intensity, QueryTrace, RankedCandidate};
use pedant_llm::prompt::truncate;

use crate::colors::{self, ansi};
use crate::session::{Reply, ReplySource, SessionStats, Turn};

const RULE_WIDTH: usize = 60;
const UTTERANCE_PREVIEW: usize = 40;
const REPLY_PREVIEW: usize = 50;

fn rule() -> String {
    colors::dim(&"─".repeat(RULE_WIDTH))
}

/// `[#####-----] 5/10`
#[must_use]
pub fn meter(intensity: Intensity) -> String {
    let filled = usize::from(intensity.value());
    let empty = usize::from(Intensity::MAX) - filled;
    format!(
        "[{}{}] {}/{}",
        "#".repeat(filled),
        "-".repeat(empty),
        intensity.value(),
        Intensity::MAX
    )
}

fn colored_meter(intensity: Intensity) -> String {
    format!(
        "{}{}{}",
        colors::for_intensity(intensity.value()),
        meter(intensity),
        ansi::RESET
    )
}

/// A persona line with its meter, the reply, then the follow-up if shown.
#[must_use]
pub fn reply(persona_name: &str, reply: &Reply) -> String {
    let mut out = format!(
        "{} {}",
        colors::header(&format!("{persona_name}:")),
        colored_meter(reply.intensity)
    );
    if let ReplySource::Generated { model } = &reply.source {
        let _ = write!(out, " {}", colors::dim(&format!("({model})")));
    }
    let _ = write!(out, "\n{}", colors::persona(&reply.text));
    if let Some(follow_up) = &reply.follow_up {
        let _ = write!(out, "\n\n{}", colors::persona(follow_up));
    }
    out
}

/// Greeting or goodbye line.
#[must_use]
pub fn bookend(persona_name: &str, text: &str) -> String {
    format!(
        "{}\n{}",
        colors::header(&format!("{persona_name}:")),
        colors::persona(text)
    )
}

/// `/sass`
#[must_use]
pub fn sass_legend() -> String {
    let rows = [
        (10, "MAXIMUM PEDANTRY"),
        (8, "HIGH CONFIDENCE"),
        (5, "MODERATE SNARK"),
        (3, "MILD CORRECTION"),
        (0, "POLITE (RARE)"),
    ];
    let mut out = colors::header("Sass-o-meter");
    for (level, label) in rows {
        let meter = Intensity::new(level).map(colored_meter).unwrap_or_default();
        let _ = write!(out, "\n  {meter:<28} {label}");
    }
    out
}

/// `/history`
#[must_use]
pub fn history(persona_name: &str, turns: &[Turn]) -> String {
    if turns.is_empty() {
        return colors::dim("No conversation yet.");
    }
    let mut out = format!("{}\n{}", rule(), colors::dim("Recent conversation:"));
    for turn in turns {
        let _ = write!(
            out,
            "\n{}\n{}",
            colors::dim(&format!(
                "  [{}] You: {}",
                turn.at.format("%H:%M:%S"),
                truncate(&turn.utterance, UTTERANCE_PREVIEW)
            )),
            colors::dim(&format!(
                "  {persona_name} [sass:{}]: {}",
                turn.intensity,
                truncate(&turn.reply, REPLY_PREVIEW)
            )),
        );
    }
    let _ = write!(out, "\n{}", rule());
    out
}

/// `/stats`
#[must_use]
pub fn session_stats(persona_name: &str, stats: &SessionStats) -> String {
    format!(
        "{}\n{}\nResponses given: {}\nAverage sass level: {:.1}/10\nTotal pedantry points: {}\nFallbacks: {}\nGenerated: {}\n{}",
        colors::header(&format!("{persona_name}'s session statistics")),
        rule(),
        stats.turns,
        stats.average_intensity(),
        stats.total_intensity,
        stats.fallbacks,
        stats.generated,
        rule(),
    )
}

/// `/help`
#[must_use]
pub fn help() -> String {
    format!(
        "{}\n{}\n{}\n{}",
        colors::header("Commands"),
        rule(),
        [
            "/sass        Show the sass-o-meter legend",
            "/history     Show recent conversation",
            "/stats       Show session statistics",
            "/why <text>  Show how <text> would be ranked",
            "/help        Show this message",
            "exit, quit   End the conversation",
        ]
        .join("\n"),
        rule(),
    )
}

/// `/why <text>`
#[must_use]
pub fn why(trace: &QueryTrace, ranked: &[RankedCandidate]) -> String {
    let mut out = format!(
        "{} {}\n{} {}",
        colors::dim("stems:"),
        trace.stems.join(" "),
        colors::dim("query:"),
        trace.query.iter().map(String::as_str).collect::<Vec<_>>().join(" "),
    );
    if !trace.phrases.is_empty() {
        let phrases: Vec<&str> = trace.phrases.iter().map(String::as_str).collect();
        let _ = write!(out, "\n{} {}", colors::dim("phrases:"), phrases.join(", "));
    }
    if ranked.is_empty() {
        let _ = write!(out, "\n{}", colors::warning("no candidates: this would fall back"));
        return out;
    }
    for (rank, c) in ranked.iter().enumerate() {
        let _ = write!(
            out,
            "\n{:>2}. {:<24} {:<16} score {:.3} = (idf {:.3} + phrase {:.3}) × recency {:.2} × diversity {:.2}  [{} kw]",
            rank + 1,
            c.id.as_str(),
            c.category.as_str(),
            c.score,
            c.raw_score,
            c.phrase_bonus,
            c.recency,
            c.diversity,
            c.overlap,
        );
    }
    out
}

/// `pedant --stats`
#[must_use]
pub fn corpus_stats(stats: &CorpusStats) -> String {
    let mut out = format!(
        "records: {}\ndistinct keywords: {}\nphrases: {}\nsynonym stems: {}\n\n{:<18} {:>7} {:>5} {:>5} {:>6}",
        stats.records,
        stats.distinct_keywords,
        stats.phrases,
        stats.synonym_stems,
        "category",
        "records",
        "min",
        "max",
        "avg",
    );
    for (category, c) in &stats.per_category {
        let _ = write!(
            out,
            "\n{:<18} {:>7} {:>5} {:>5} {:>6.1}",
            category.as_str(),
            c.records,
            c.min_keywords,
            c.max_keywords,
            c.avg_keywords
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(v: i64) -> Intensity {
        Intensity::new(v).expect("in range")
    }

    #[test]
    fn meter_fills_to_the_level() {
        assert_eq!(meter(level(5)), "[#####-----] 5/10");
        assert_eq!(meter(level(0)), "[----------] 0/10");
        assert_eq!(meter(level(10)), "[##########] 10/10");
    }

    #[test]
    fn reply_shows_follow_up_and_model() {
        let shown = reply(
            "Pedant",
            &Reply {
                text: "Actually, 6.8 kg.".into(),
                follow_up: Some("UCI minimum.".into()),
                intensity: level(8),
                source: ReplySource::Generated {
                    model: "llama3.2:3b".into(),
                },
                shortlist: Vec::new(),
            },
        );
        assert!(shown.contains("Actually, 6.8 kg."));
        assert!(shown.contains("UCI minimum."));
        assert!(shown.contains("[########--] 8/10"));
        assert!(shown.contains("llama3.2:3b"));
    }

    #[test]
    fn why_without_candidates_says_so() {
        let shown = why(&QueryTrace::default(), &[]);
        assert!(shown.contains("fall back"));
    }

    #[test]
    fn empty_history_is_reported() {
        assert!(history("Pedant", &[]).contains("No conversation yet"));
    }

    #[test]
    fn history_cuts_long_turns() {
        let turn = Turn {
            at: chrono::Utc::now(),
            utterance: "é".repeat(UTTERANCE_PREVIEW + 5),
            reply: "x".repeat(REPLY_PREVIEW + 5),
            intensity: level(6),
            source: ReplySource::Fallback,
        };
        let shown = history("Pedant", &[turn]);
        assert!(shown.contains(&format!("You: {}...", "é".repeat(UTTERANCE_PREVIEW))));
        assert!(shown.contains(&format!("[sass:6/10]: {}...", "x".repeat(REPLY_PREVIEW))));
    }
}
