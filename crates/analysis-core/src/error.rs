use thiserror::Error;

/// Rejection of a malformed evaluation request at the pipeline boundary.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid candle at {series}[{index}]: {reason}")]
    InvalidCandle {
        series: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
