//! Classifier contract the pipeline scores against

use crate::error::Result;
use crate::feature_engineer::FeatureVector;

/// A pre-trained binary churn classifier.
///
/// Implementations are loaded once and shared read-only across concurrent
/// requests. Failures are reported as [`InferenceError::Prediction`].
///
/// [`InferenceError::Prediction`]: crate::error::InferenceError::Prediction
pub trait Classifier: Send + Sync {
    /// Hard label for a single row: 1 = attrited, 0 = existing
    fn predict(&self, features: &FeatureVector) -> Result<u8>;

    /// Probability of class 1 (attrition) for a single row
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64>;

    /// Label and probability for one row. The default makes two calls;
    /// backends that produce both from one run override it.
    fn predict_with_proba(&self, features: &FeatureVector) -> Result<(u8, f64)> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }

    /// Model name, for logs
    fn name(&self) -> &str;
}
