//! End-to-end churn inference: validate, engineer, classify, assess.

use crate::error::{InferenceError, Result};
use crate::feature_engineer::FeatureEngineer;
use crate::models::classifier::Classifier;
use crate::risk::RiskClassifier;
use crate::types::prediction::PredictionResult;
use crate::types::profile::CustomerProfile;
use crate::validator::ProfileValidator;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// The classifier dependency, resolved once at start-up.
#[derive(Clone)]
enum ModelState {
    Loaded(Arc<dyn Classifier>),
    /// Load failed or no artifact; carries the reason
    Unavailable(String),
}

/// Single entry point for scoring a customer.
///
/// Holds no mutable state; share it behind an `Arc` and call it from as
/// many workers as needed. Failures are terminal for the request and are
/// never retried, since every stage is deterministic.
#[derive(Clone)]
pub struct InferenceOrchestrator {
    validator: ProfileValidator,
    engineer: FeatureEngineer,
    risk: RiskClassifier,
    model: ModelState,
}

impl InferenceOrchestrator {
    /// Create an orchestrator around a loaded classifier.
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self::with_state(ModelState::Loaded(classifier))
    }

    /// Create an orchestrator whose every request fails with
    /// [`InferenceError::ModelUnavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::with_state(ModelState::Unavailable(reason.into()))
    }

    fn with_state(model: ModelState) -> Self {
        Self {
            validator: ProfileValidator::new(),
            engineer: FeatureEngineer::new(),
            risk: RiskClassifier::new(),
            model,
        }
    }

    /// Whether a classifier is loaded.
    pub fn is_ready(&self) -> bool {
        matches!(self.model, ModelState::Loaded(_))
    }

    pub fn model_name(&self) -> Option<&str> {
        match &self.model {
            ModelState::Loaded(classifier) => Some(classifier.name()),
            ModelState::Unavailable(_) => None,
        }
    }

    /// Score a raw JSON record.
    pub fn infer(&self, raw: &Value) -> Result<PredictionResult> {
        let profile = self.validator.validate(raw)?;
        self.infer_profile(&profile)
    }

    /// Score a raw JSON payload.
    pub fn infer_slice(&self, payload: &[u8]) -> Result<PredictionResult> {
        let profile = self.validator.validate_slice(payload)?;
        self.infer_profile(&profile)
    }

    /// Score an already typed profile, skipping boundary validation.
    pub fn infer_profile(&self, profile: &CustomerProfile) -> Result<PredictionResult> {
        let classifier = self.classifier()?;

        let features = self.engineer.engineer(profile)?;

        let (label, probability) = classifier.predict_with_proba(&features)?;

        if label > 1 {
            return Err(InferenceError::Prediction(format!(
                "Classifier returned label {}, expected 0 or 1",
                label
            )));
        }
        if !(0.0..=1.0).contains(&probability) {
            return Err(InferenceError::Prediction(format!(
                "Classifier returned probability {}, expected a value in [0, 1]",
                probability
            )));
        }

        let assessment = self.risk.assess(label, probability);

        debug!(
            model = %classifier.name(),
            label = label,
            probability = probability,
            risk_tier = %assessment.tier.as_str(),
            "Customer scored"
        );

        Ok(PredictionResult::new(assessment, probability))
    }

    /// Score several records independently; results keep input order.
    pub fn infer_batch(&self, raws: &[Value]) -> Vec<Result<PredictionResult>> {
        raws.iter().map(|raw| self.infer(raw)).collect()
    }

    fn classifier(&self) -> Result<&dyn Classifier> {
        match &self.model {
            ModelState::Loaded(classifier) => Ok(classifier.as_ref()),
            ModelState::Unavailable(reason) => {
                Err(InferenceError::ModelUnavailable(reason.clone()))
            }
        }
    }
}
