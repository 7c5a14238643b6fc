//! Prediction result and wire response structures

use crate::error::{ErrorKind, InferenceError};
use crate::risk::{ChurnStatus, RiskAssessment, RiskTier};
use serde::{Deserialize, Serialize};

/// Decimal places kept in the reported probability.
pub const PROBABILITY_DECIMALS: i32 = 4;

/// Round a probability to [`PROBABILITY_DECIMALS`] places, half away from zero.
pub fn round_probability(probability: f64) -> f64 {
    let scale = 10f64.powi(PROBABILITY_DECIMALS);
    (probability * scale).round() / scale
}

/// Churn prediction for a single customer. Created per request, owned by the
/// caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Hard classification
    #[serde(rename = "prediction")]
    pub label: ChurnStatus,

    /// Churn probability (0.0 - 1.0), four decimal places
    #[serde(rename = "churn_probability")]
    pub probability: f64,

    pub risk_tier: RiskTier,

    pub recommended_action: String,
}

impl PredictionResult {
    /// Package a risk assessment; the probability is rounded here.
    pub fn new(assessment: RiskAssessment, probability: f64) -> Self {
        Self {
            label: assessment.status,
            probability: round_probability(probability),
            risk_tier: assessment.tier,
            recommended_action: assessment.recommended_action.to_string(),
        }
    }
}

/// Error body returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
}

impl From<&InferenceError> for ErrorResponse {
    fn from(err: &InferenceError) -> Self {
        Self {
            error: err.kind(),
            message: err.message().to_string(),
        }
    }
}

/// Response sent back for a scoring request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScoringResponse {
    Success(PredictionResult),
    Failure(ErrorResponse),
}

impl From<Result<PredictionResult, InferenceError>> for ScoringResponse {
    fn from(outcome: Result<PredictionResult, InferenceError>) -> Self {
        match outcome {
            Ok(result) => ScoringResponse::Success(result),
            Err(err) => ScoringResponse::Failure(ErrorResponse::from(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskClassifier;

    #[test]
    fn test_round_probability() {
        assert_eq!(round_probability(0.123456), 0.1235);
        assert_eq!(round_probability(0.99999), 1.0);
        assert_eq!(round_probability(0.0), 0.0);
        assert_eq!(round_probability(0.7), 0.7);
    }

    #[test]
    fn test_prediction_result_serialization() {
        let assessment = RiskClassifier::new().assess(1, 0.81234567);
        let result = PredictionResult::new(assessment, 0.81234567);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["prediction"], "Attrited Customer");
        assert_eq!(json["churn_probability"], 0.8123);
        assert_eq!(json["risk_tier"], "critical");
        assert_eq!(
            json["recommended_action"],
            "CRITICAL RISK: Call Immediately & Offer VIP Retention Package ($20 cost)"
        );

        let deserialized: PredictionResult = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized, result);
    }

    #[test]
    fn test_scoring_response_failure_shape() {
        let outcome = Err(InferenceError::ModelUnavailable("no model loaded".to_string()));
        let response = ScoringResponse::from(outcome);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "model_unavailable");
        assert_eq!(json["message"], "no model loaded");
        assert!(json.get("prediction").is_none());
    }
}
