use thiserror::Error;

#[derive(Debug, Error)]
pub enum PairsError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Misaligned series '{left}' ({left_len} points) and '{right}' ({right_len} points): {detail}")]
    MisalignedSeries {
        left: String,
        right: String,
        left_len: usize,
        right_len: usize,
        detail: String,
    },

    #[error("Singular regression in {context}")]
    SingularRegression { context: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PairsError {
    fn from(e: serde_json::Error) -> Self {
        PairsError::SerializationError(e.to_string())
    }
}
