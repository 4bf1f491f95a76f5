//! The corpus index: validated response records plus everything derived from
//! them at build time.
//!
//! Built once before the conversation starts and read-only afterwards. The
//! build either accepts the whole input or rejects it with the first
//! [`CorpusValidationError`]; a partially loaded corpus is never produced.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::info;

use crate::config::TextConfig;
use crate::error::{CorpusValidationError, Violation};
use crate::synonyms::{SynonymSource, SynonymTable};
use crate::text::Normalizer;
use crate::types::{Category, Intensity, RawRecord, RecordId, ResponseRecord};

/// A multi-word keyword, kept both joined and split for contiguous matching.
#[derive(Debug, Clone)]
struct Phrase {
    canonical: String,
    stems: Vec<String>,
}

/// Immutable, indexed response corpus.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    /// Records in id-ascending order; all indices below refer to this order.
    records: Vec<ResponseRecord>,
    by_id: HashMap<RecordId, usize>,
    /// Canonical keyword → indices of records carrying it, ascending.
    postings: HashMap<String, Vec<usize>>,
    /// Memoized `ln(1 + N / (1 + count))` per canonical keyword.
    idf: HashMap<String, f64>,
    /// Multi-word keywords keyed by their first stem.
    phrases: HashMap<String, Vec<Phrase>>,
    synonyms: SynonymTable,
    normalizer: Normalizer,
}

/// Per-category keyword coverage, as reported by [`CorpusIndex::stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    /// Records tagged with the category.
    pub records: usize,
    /// Fewest keywords on one record.
    pub min_keywords: usize,
    /// Most keywords on one record.
    pub max_keywords: usize,
    /// Mean keywords per record.
    pub avg_keywords: f64,
}

/// Summary of an index.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    /// Total records.
    pub records: usize,
    /// Distinct canonical keywords.
    pub distinct_keywords: usize,
    /// Distinct multi-word keywords.
    pub phrases: usize,
    /// Stems with at least one synonym expansion.
    pub synonym_stems: usize,
    /// Coverage per category; categories without records are omitted.
    pub per_category: BTreeMap<Category, CategoryStats>,
}

impl CorpusIndex {
    /// Validate `raw` and build the index.
    ///
    /// Keywords and synonym entries are normalized with the same
    /// [`Normalizer`] built from `text`.
    ///
    /// # Errors
    /// Returns the first [`CorpusValidationError`] found, in input order.
    pub fn build(
        raw: impl IntoIterator<Item = RawRecord>,
        synonyms: &SynonymSource,
        text: &TextConfig,
    ) -> Result<Self, CorpusValidationError> {
        let normalizer = Normalizer::new(text);
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut records = Vec::new();

        for (position, record) in raw.into_iter().enumerate() {
            let validated = validate(record, position, &normalizer, &seen)?;
            seen.insert(validated.id.0.clone(), position);
            records.push(validated);
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        let synonyms = SynonymTable::compile(synonyms, &normalizer);
        let index = Self::from_records(records, synonyms, normalizer);

        info!(
            records = index.records.len(),
            keywords = index.idf.len(),
            phrases = index.phrases.values().map(Vec::len).sum::<usize>(),
            synonym_stems = index.synonyms.len(),
            "corpus index built"
        );
        Ok(index)
    }

    fn from_records(
        records: Vec<ResponseRecord>,
        synonyms: SynonymTable,
        normalizer: Normalizer,
    ) -> Self {
        let by_id = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            for keyword in &record.canonical_keywords {
                postings.entry(keyword.clone()).or_default().push(i);
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let total = records.len() as f64;
        let idf = postings
            .iter()
            .map(|(keyword, hits)| {
                #[allow(clippy::cast_precision_loss)]
                let count = hits.len() as f64;
                (keyword.clone(), (1.0 + total / (1.0 + count)).ln())
            })
            .collect();

        let mut phrases: HashMap<String, Vec<Phrase>> = HashMap::new();
        for keyword in postings.keys().filter(|k| k.contains(' ')) {
            let stems: Vec<String> = keyword.split(' ').map(str::to_string).collect();
            if let Some(head) = stems.first() {
                phrases.entry(head.clone()).or_default().push(Phrase {
                    canonical: keyword.clone(),
                    stems,
                });
            }
        }

        Self {
            records,
            by_id,
            postings,
            idf,
            phrases,
            synonyms,
            normalizer,
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// Number of records.
    #[must_use]
    pub fn size(&self) -> usize {
        self.records.len()
    }

    /// Whether the corpus has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResponseRecord> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    /// All records, id ascending.
    #[must_use]
    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    /// Memoized IDF weight of a canonical keyword, `None` if no record has it.
    #[must_use]
    pub fn idf(&self, keyword: &str) -> Option<f64> {
        self.idf.get(keyword).copied()
    }

    /// Synonym expansion of a stem, including the stem itself.
    #[must_use]
    pub fn expand(&self, stem: &str) -> BTreeSet<String> {
        self.synonyms.expand(stem)
    }

    /// The normalizer keywords were indexed with.
    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Record count per category, omitting empty categories.
    #[must_use]
    pub fn categories(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.category).or_insert(0) += 1;
        }
        counts
    }

    /// Multi-word keywords occurring contiguously in `stems`.
    #[must_use]
    pub fn detect_phrases(&self, stems: &[String]) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        for (start, stem) in stems.iter().enumerate() {
            let Some(candidates) = self.phrases.get(stem) else {
                continue;
            };
            let tail = &stems[start..];
            for phrase in candidates {
                if tail.starts_with(&phrase.stems) {
                    found.insert(phrase.canonical.clone());
                }
            }
        }
        found
    }

    /// Keyword coverage summary.
    #[must_use]
    pub fn stats(&self) -> CorpusStats {
        let mut per_category: BTreeMap<Category, (usize, usize, usize, usize)> = BTreeMap::new();
        for record in &self.records {
            let n = record.keywords.len();
            let entry = per_category
                .entry(record.category)
                .or_insert((0, usize::MAX, 0, 0));
            entry.0 += 1;
            entry.1 = entry.1.min(n);
            entry.2 = entry.2.max(n);
            entry.3 += n;
        }

        let per_category = per_category
            .into_iter()
            .map(|(category, (records, min, max, sum))| {
                #[allow(clippy::cast_precision_loss)]
                let avg_keywords = sum as f64 / records as f64;
                let stats = CategoryStats {
                    records,
                    min_keywords: min,
                    max_keywords: max,
                    avg_keywords,
                };
                (category, stats)
            })
            .collect();

        CorpusStats {
            records: self.records.len(),
            distinct_keywords: self.idf.len(),
            phrases: self.phrases.values().map(Vec::len).sum(),
            synonym_stems: self.synonyms.len(),
            per_category,
        }
    }

    // -----------------------------------------------------------------------
    // Engine access
    // -----------------------------------------------------------------------

    /// Indices of records carrying `keyword`.
    pub(crate) fn postings(&self, keyword: &str) -> &[usize] {
        self.postings
            .get(keyword)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn record_at(&self, index: usize) -> &ResponseRecord {
        &self.records[index]
    }
}

fn validate(
    raw: RawRecord,
    position: usize,
    normalizer: &Normalizer,
    seen: &HashMap<String, usize>,
) -> Result<ResponseRecord, CorpusValidationError> {
    let fail = |violation| CorpusValidationError {
        record_id: raw.id.clone(),
        position,
        violation,
    };

    if raw.id.trim().is_empty() {
        return Err(fail(Violation::EmptyId));
    }
    if let Some(&first_position) = seen.get(&raw.id) {
        return Err(fail(Violation::DuplicateId { first_position }));
    }
    let category = raw
        .category
        .parse::<Category>()
        .map_err(|_| fail(Violation::UnknownCategory(raw.category.clone())))?;
    let intensity =
        Intensity::new(raw.intensity).ok_or_else(|| fail(Violation::IntensityOutOfRange(raw.intensity)))?;
    if raw.keywords.is_empty() {
        return Err(fail(Violation::EmptyKeywords));
    }

    let mut keywords = Vec::with_capacity(raw.keywords.len());
    let mut canonical_keywords = BTreeSet::new();
    for keyword in &raw.keywords {
        let canonical = normalizer
            .canonical(keyword)
            .ok_or_else(|| fail(Violation::BlankKeyword(keyword.clone())))?;
        keywords.push(keyword.trim().to_lowercase());
        canonical_keywords.insert(canonical);
    }

    Ok(ResponseRecord {
        id: RecordId(raw.id),
        category,
        keywords,
        canonical_keywords,
        body: raw.body,
        follow_up: raw.follow_up,
        intensity,
    })
}
