use thiserror::Error;

/// Reasons an adapter refuses to hand a row to the engine.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    #[error("{field} must be finite")]
    NotFinite { field: &'static str },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be a percentage in [0, 100], got {value}")]
    PercentageOutOfRange { field: &'static str, value: f64 },

    #[error("missing column: {0}")]
    MissingField(&'static str),

    #[error("invalid number in {field}: {raw:?}")]
    InvalidNumber { field: &'static str, raw: String },
}
