//! Core type definitions for response records.
//!
//! Raw records come from any external source; [`crate::corpus::CorpusIndex::build`]
//! validates them into [`ResponseRecord`]s.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable identifier of a response record, unique across the corpus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RecordId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Closed set of topic tags a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Papers, experiments, methodology.
    Research,
    /// PhD life, supervisors, peer review.
    Academia,
    /// Molecules, synthesis, drug discovery.
    Chemistry,
    /// Models, training, neural networks.
    MachineLearning,
    /// Bikes, rides, watts.
    Cycling,
    /// Running, gym, climbing.
    Fitness,
    /// Meals, coffee, nutrition.
    Food,
    /// Home, plants, routines.
    Lifestyle,
    /// Jobs, careers, meetings.
    Work,
    /// Self-description, height, being correct.
    Personality,
    /// Small talk.
    Conversational,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Research,
        Self::Academia,
        Self::Chemistry,
        Self::MachineLearning,
        Self::Cycling,
        Self::Fitness,
        Self::Food,
        Self::Lifestyle,
        Self::Work,
        Self::Personality,
        Self::Conversational,
    ];

    /// The `snake_case` tag used in corpus files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Academia => "academia",
            Self::Chemistry => "chemistry",
            Self::MachineLearning => "machine_learning",
            Self::Cycling => "cycling",
            Self::Fitness => "fitness",
            Self::Food => "food",
            Self::Lifestyle => "lifestyle",
            Self::Work => "work",
            Self::Personality => "personality",
            Self::Conversational => "conversational",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown category: '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Intensity
// ---------------------------------------------------------------------------

/// Sass level of a response, always within `[0, 10]`.
///
/// Visible to callers only; it never influences the matching score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Intensity(u8);

impl Intensity {
    /// Highest allowed intensity.
    pub const MAX: u8 = 10;

    /// Mid-scale default used for generated or fallback replies.
    pub const NEUTRAL: Self = Self(5);

    /// Validate a raw value. Returns `None` outside `[0, 10]`.
    #[must_use]
    pub fn new(raw: i64) -> Option<Self> {
        u8::try_from(raw)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
    }

    /// Raw value in `[0, 10]`.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A record definition as it arrives from a corpus source, before validation.
///
/// Accepts the legacy field names `response` and `sass_level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Record id.
    pub id: String,
    /// Topic tag; checked against [`Category`] at build time.
    pub category: String,
    /// Keyword strings (single words or multi-word phrases).
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Response text template.
    #[serde(alias = "response")]
    pub body: String,
    /// Optional secondary template.
    #[serde(default)]
    pub follow_up: Option<String>,
    /// Sass level; checked against `[0, 10]` at build time.
    #[serde(alias = "sass_level", default = "default_intensity")]
    pub intensity: i64,
}

fn default_intensity() -> i64 {
    i64::from(Intensity::NEUTRAL.value())
}

/// A validated, immutable response record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    /// Unique id.
    pub id: RecordId,
    /// Topic tag.
    pub category: Category,
    /// Keywords as written in the corpus, lowercased.
    pub keywords: Vec<String>,
    /// Stemmed canonical forms of [`Self::keywords`]; multi-word keywords
    /// are stored as space-joined stems.
    pub canonical_keywords: BTreeSet<String>,
    /// Response text template.
    pub body: String,
    /// Optional secondary template.
    pub follow_up: Option<String>,
    /// Sass level.
    pub intensity: Intensity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_loosely() {
        assert_eq!("Machine-Learning".parse::<Category>(), Ok(Category::MachineLearning));
        assert_eq!(" cycling ".parse::<Category>(), Ok(Category::Cycling));
        assert!("astrology".parse::<Category>().is_err());
    }

    #[test]
    fn category_round_trips_through_as_str() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>(), Ok(c));
        }
    }

    #[test]
    fn intensity_bounds() {
        assert_eq!(Intensity::new(0).map(Intensity::value), Some(0));
        assert_eq!(Intensity::new(10).map(Intensity::value), Some(10));
        assert!(Intensity::new(11).is_none());
        assert!(Intensity::new(-1).is_none());
    }

    #[test]
    fn raw_record_accepts_legacy_field_names() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"id":"x","category":"food","keywords":["lunch"],"response":"Eat.","sass_level":7}"#,
        )
        .expect("parse");
        assert_eq!(raw.body, "Eat.");
        assert_eq!(raw.intensity, 7);
        assert!(raw.follow_up.is_none());
    }
}
