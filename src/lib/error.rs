use serde::Serialize;
use thiserror::Error;

/// Errors raised while estimating the posterior difference.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum EstimatorError {
    #[error("invalid input for {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },
    #[error("cannot draw {sample_count} samples, at least one is required")]
    DegenerateSample { sample_count: usize },
    #[error("numeric instability: {message}")]
    NumericInstability { message: String },
}

impl EstimatorError {
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        EstimatorError::InvalidInput {
            field,
            message: message.into(),
        }
    }

    pub fn numeric_instability(message: impl Into<String>) -> Self {
        EstimatorError::NumericInstability {
            message: message.into(),
        }
    }
}
