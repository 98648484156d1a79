use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenfordError {
    #[error("Invalid digit kind: {0} (expected one of FD, SD, FTD, F3D, LTD)")]
    InvalidDigitKind(String),

    #[error("Type conversion error: none of the {total} records could be converted to a number")]
    TypeConversionError { total: usize },

    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for BenfordError {
    fn from(e: serde_json::Error) -> Self {
        BenfordError::SerializationError(e.to_string())
    }
}
