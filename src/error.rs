//! Error types for encoder construction and encoding.

use thiserror::Error;

/// Errors raised while building an encoder or encoding a batch.
///
/// All of these are fatal for the operation that produced them. The only
/// non-error substitution the encoder performs is mapping out-of-vocabulary
/// word ids to the unknown row.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// A token carries a different number of factors than the model has tables.
    #[error("factor count mismatch at position {position}: model has {expected} factors, token has {found}")]
    FactorCountMismatch {
        position: usize,
        expected: usize,
        found: usize,
    },

    /// A backward scan was requested without per-sentence lengths.
    #[error("backward scan requires sentence lengths")]
    MissingSentenceLengths,

    /// Sentence lengths do not cover the batch.
    #[error("expected {expected} sentence lengths, got {found}")]
    SentenceLengthsMismatch { expected: usize, found: usize },

    /// Cell variant name not recognised.
    #[error("unknown cell type '{0}' (expected gru, lstm or mlstm)")]
    UnknownCellType(String),

    /// A required tensor is missing from the weight source.
    #[error("weight '{0}' not found")]
    MissingWeight(String),

    /// A tensor has the wrong shape.
    #[error("weight '{name}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// An embedding table is too small to hold the reserved unknown row.
    #[error("embedding table for factor {factor} has {rows} rows, needs at least 2")]
    InvalidEmbeddingTable { factor: usize, rows: usize },

    /// Configured cell variant does not match the weights supplied for a direction.
    #[error("{direction} cell configured as {expected} but weights are for a different cell")]
    CellWeightsMismatch {
        direction: &'static str,
        expected: String,
    },

    /// The batch has no token stream with this index.
    #[error("tab {tab} out of range, sentence has {available} streams")]
    TabOutOfRange { tab: usize, available: usize },

    /// Configuration is structurally invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EncoderError>;
