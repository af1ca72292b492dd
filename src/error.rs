use thiserror::Error;

/// Everything that can go wrong while building, mutating, persisting, or
/// scoring a prediction container.
///
/// Validation variants are deterministic contract violations and are
/// surfaced immediately; the passthrough variants at the bottom forward
/// storage-layer failures unchanged.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// A column does not cover the store's row universe (wrong length, or
    /// a different set of row ids).
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("model '{0}' already exists")]
    DuplicateModelName(String),

    #[error("duplicate row id '{0}'")]
    DuplicateRowId(String),

    #[error("unknown model '{0}'")]
    UnknownModelName(String),

    /// `Prediction::set` takes a single-model right-hand side.
    #[error("expected exactly one model, found {0}")]
    SingleModelRequired(usize),

    /// CSV submission files hold one model per file.
    #[error("CSV export requires exactly one model, found {0}")]
    MultiModelCsvUnsupported(usize),

    #[error("malformed CSV at line {line}: {reason}")]
    MalformedCsv { line: usize, reason: String },

    #[error("row ids of prediction and validation targets differ")]
    RowIdMismatch,

    #[error("dominance requires exactly two models, found {0}")]
    DominanceRequiresPair(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PredictionError>;
