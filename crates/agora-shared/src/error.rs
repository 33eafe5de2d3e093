use thiserror::Error;

/// Failure to turn caller-supplied text into one of the shared value types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown sort mode: {0}")]
    SortMode(String),

    #[error("Voice must be 1 or -1, got {0}")]
    Voice(i64),

    #[error("Unknown related entity: {0}")]
    Related(String),

    #[error("Empty thread reference")]
    EmptyThreadRef,
}
