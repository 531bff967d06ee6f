//! Error types for the Ronda engine.
//!
//! Every public entry point returns either a complete report or one of these
//! errors. Undefined statistics are not errors: they surface as NaN inside a
//! report so callers can filter them before ranking.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for Ronda operations.
#[derive(Debug, Error)]
pub enum RondaError {
    /// Fewer aligned or bucketed rows than an analysis needs.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A configuration value was rejected at call time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error due to invalid or malformed data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Error when a required column is missing from the data.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Error from Polars operations.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Error raised by a signal provider while computing a signal.
    #[error("signal computation failed: {0}")]
    SignalComputation(String),

    /// Error when a signal is not registered.
    #[error("signal not found: {0}")]
    SignalNotFound(String),
}

impl RondaError {
    /// Shorthand for [`RondaError::InsufficientData`].
    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    /// Shorthand for [`RondaError::InvalidConfig`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Converts the error into the serializable `{error: reason}` shape.
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            error: self.to_string(),
        }
    }
}

/// Serializable form of a failed analysis, `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Human-readable failure reason.
    pub error: String,
}

impl From<&RondaError> for ErrorReport {
    fn from(err: &RondaError) -> Self {
        err.to_report()
    }
}

/// A specialized Result type for Ronda operations.
pub type Result<T> = std::result::Result<T, RondaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RondaError::insufficient("need at least 2 aligned rows, got 1");
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 2 aligned rows, got 1"
        );

        let err = RondaError::MissingColumn("close".to_string());
        assert_eq!(err.to_string(), "missing required column: close");
    }

    #[test]
    fn test_error_report_shape() {
        let err = RondaError::config("quantiles must be at least 2");
        let json = serde_json::to_value(err.to_report()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "error": "invalid configuration: quantiles must be at least 2" })
        );
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: Result<i32> = Err(RondaError::SignalNotFound("rsi".to_string()));
        assert!(matches!(err_result, Err(RondaError::SignalNotFound(_))));
    }
}
