//! Error types for the Pedant core library.

use thiserror::Error;

/// Top-level error type for all core operations.
#[derive(Error, Debug)]
pub enum PedantError {
    /// The corpus failed validation; the whole load is rejected.
    #[error(transparent)]
    CorpusValidation(#[from] CorpusValidationError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, PedantError>;

/// A raw record broke a corpus invariant.
///
/// Carries the offending record id and its position in the input sequence,
/// so records with a blank id can still be located.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("corpus record '{record_id}' (#{position}) is invalid: {violation}")]
pub struct CorpusValidationError {
    /// Id of the offending record, as written in the source.
    pub record_id: String,
    /// Zero-based position of the record in the input.
    pub position: usize,
    /// Which invariant was violated.
    pub violation: Violation,
}

/// The invariant a record violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Another record already uses this id.
    #[error("duplicate id (first defined by record #{first_position})")]
    DuplicateId {
        /// Position of the record that claimed the id first.
        first_position: usize,
    },
    /// The id is empty or whitespace.
    #[error("id is empty")]
    EmptyId,
    /// The keyword list is empty.
    #[error("keyword list is empty")]
    EmptyKeywords,
    /// A keyword contains no indexable token after normalization.
    #[error("keyword '{0}' has no indexable tokens")]
    BlankKeyword(String),
    /// The category is not one of the enumerated topics.
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    /// Intensity falls outside `[0, 10]`.
    #[error("intensity {0} is outside [0, 10]")]
    IntensityOutOfRange(i64),
}
