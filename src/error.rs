//! Error types for the pairs optimizer

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors returned by the public pipeline contracts.
///
/// Shape, column, threshold and range errors indicate caller misuse and are
/// never retried. Per-configuration failures inside a grid sweep are logged
/// and skipped instead of being surfaced.
#[derive(Error, Debug)]
pub enum PairsError {
    /// Table does not hold exactly two price columns, or column lengths disagree
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// A column required by the stage is absent from the input frame
    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    /// Entry threshold does not strictly exceed the exit threshold
    #[error("Invalid thresholds: entry_z ({entry_z}) must be strictly greater than exit_z ({exit_z})")]
    InvalidThreshold { entry_z: f64, exit_z: f64 },

    /// Fraction, period count or window outside its valid bounds
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Not enough rows survive the warmup period
    #[error("Insufficient data: expected at least {expected} rows, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Date index is not strictly increasing
    #[error("Index is not strictly increasing at row {row}")]
    UnsortedIndex { row: usize },

    /// Price is NaN or infinite
    #[error("Non-finite price in column '{column}' at row {row}")]
    NonFinitePrice { column: String, row: usize },

    /// Signal cell holds something other than -1, 0 or +1
    #[error("Invalid signal value {value} at row {row}: expected -1, 0 or +1")]
    InvalidSignal { row: usize, value: f64 },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error raised by polars while converting frames
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Result type with [`PairsError`]
pub type Result<T> = std::result::Result<T, PairsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_message_names_both_values() {
        let err = PairsError::InvalidThreshold {
            entry_z: 0.5,
            exit_z: 2.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.5"));
        assert!(msg.contains("2"));
    }

    #[test]
    fn test_signal_message_names_row_and_value() {
        let msg = PairsError::InvalidSignal { row: 3, value: 2.0 }.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("value 2"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: PairsError = parse.unwrap_err().into();
        assert!(matches!(err, PairsError::Json(_)));
    }
}
