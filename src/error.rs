//! Error types for the churn inference pipeline.

use serde::Serialize;
use thiserror::Error;

/// Failure of a single inference request.
///
/// Every stage of the pipeline is deterministic, so none of these are
/// retried: the same input fails the same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// Raw input is missing a field, has a wrong type or an unknown enum value
    #[error("Validation error: {0}")]
    Validation(String),

    /// A profile that cannot be turned into a feature vector
    #[error("Feature engineering error: {0}")]
    FeatureEngineering(String),

    /// No classifier is loaded
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The classifier failed while scoring
    #[error("Prediction error: {0}")]
    Prediction(String),
}

impl InferenceError {
    /// Stable machine-readable kind, used on the wire and in metrics.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InferenceError::Validation(_) => ErrorKind::ValidationError,
            InferenceError::FeatureEngineering(_) => ErrorKind::FeatureEngineeringError,
            InferenceError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            InferenceError::Prediction(_) => ErrorKind::PredictionError,
        }
    }

    /// Human-readable detail without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            InferenceError::Validation(msg)
            | InferenceError::FeatureEngineering(msg)
            | InferenceError::ModelUnavailable(msg)
            | InferenceError::Prediction(msg) => msg,
        }
    }

    /// Whether the caller sent bad input (as opposed to a server-side failure).
    pub fn is_client_error(&self) -> bool {
        matches!(self, InferenceError::Validation(_))
    }
}

/// Error kind reported alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    FeatureEngineeringError,
    ModelUnavailable,
    PredictionError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::FeatureEngineeringError => "feature_engineering_error",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::PredictionError => "prediction_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, InferenceError>;
