//! Placeholder substitution for response bodies and follow-ups.
//!
//! Placeholders are `{name}` where `name` is an identifier. Only a closed set
//! of names is resolved:
//!
//! | Placeholder     | Value                                                      |
//! |-----------------|------------------------------------------------------------|
//! | `{user_input}`  | the utterance, trimmed                                     |
//! | `{user_phrase}` | longest noun-like word run, else the whole utterance       |
//!
//! Unknown identifiers become empty text. Braces that do not wrap an
//! identifier (`{}`, `{ x }`, a lone `{`) are copied through unchanged.

use tracing::debug;

use crate::text::key_phrase;

/// Values available to a template, derived from one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext<'a> {
    user_input: &'a str,
    user_phrase: String,
}

impl<'a> TemplateContext<'a> {
    /// Derive the substitution values for `utterance`.
    #[must_use]
    pub fn from_utterance(utterance: &'a str) -> Self {
        let user_input = utterance.trim();
        let user_phrase = key_phrase(user_input).unwrap_or_else(|| user_input.to_string());
        Self {
            user_input,
            user_phrase,
        }
    }

    /// The extracted key phrase.
    #[must_use]
    pub fn user_phrase(&self) -> &str {
        &self.user_phrase
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "user_input" => Some(self.user_input),
            "user_phrase" => Some(&self.user_phrase),
            _ => None,
        }
    }
}

/// Resolve every placeholder in `template`. Never fails.
#[must_use]
pub fn render(template: &str, ctx: &TemplateContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_identifier(&after[..close]) => {
                let name = &after[..close];
                match ctx.lookup(name) {
                    Some(value) => out.push_str(value),
                    None => debug!(placeholder = name, "unknown template placeholder replaced with empty text"),
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
