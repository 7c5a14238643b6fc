//! ONNX Runtime backed churn classifier

use crate::error::{InferenceError, Result};
use crate::feature_engineer::FeatureVector;
use crate::models::classifier::Classifier;
use anyhow::{Context, anyhow, bail};
use ort::memory::Allocator;
use ort::session::{Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::sync::Mutex;
use tracing::debug;

/// Label and class-1 probability read from one session run.
#[derive(Debug, Clone, Copy)]
struct RawScore {
    label: Option<i64>,
    probability: f64,
}

/// Churn classifier exported to ONNX (e.g. with skl2onnx).
///
/// ONNX Runtime needs exclusive access to a session per run, so runs are
/// serialised on the session mutex. The rest of the pipeline is lock-free.
pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    label_output: Option<String>,
    probability_output: String,
}

impl OnnxClassifier {
    pub(crate) fn new(
        name: String,
        session: Session,
        input_name: String,
        label_output: Option<String>,
        probability_output: String,
    ) -> Self {
        Self {
            name,
            session: Mutex::new(session),
            input_name,
            label_output,
            probability_output,
        }
    }

    /// Run the session once on a `[1, 22]` row.
    fn score(&self, features: &FeatureVector) -> anyhow::Result<RawScore> {
        let row = model_row(features)?;
        let shape = vec![1_i64, row.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, row)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Model session lock poisoned: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let label = match &self.label_output {
            Some(name) => self.extract_label(&outputs, name)?,
            None => None,
        };
        let probability = self.extract_probability(&outputs)?;

        debug!(model = %self.name, label = ?label, probability = probability, "Session run complete");

        Ok(RawScore { label, probability })
    }

    fn extract_label(&self, outputs: &SessionOutputs, output_name: &str) -> anyhow::Result<Option<i64>> {
        let Some(output) = outputs.get(output_name) else {
            return Ok(None);
        };
        let (_, data) = output
            .try_extract_tensor::<i64>()
            .context("Label output is not an int64 tensor")?;
        Ok(data.first().copied())
    }

    /// Extract churn probability from model output.
    /// Handles both tensor outputs and seq(map) outputs (ZipMap)
    fn extract_probability(&self, outputs: &SessionOutputs) -> anyhow::Result<f64> {
        if let Some(output) = outputs.get(&self.probability_output) {
            if let Some(prob) = self.extract_from_value(output)? {
                return Ok(prob);
            }
        }

        // Fallback: any non-label output that carries probabilities
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(prob) = self.extract_from_value(&output)? {
                debug!(model = %self.name, output = %name, prob = prob, "Extracted probability (fallback)");
                return Ok(prob);
            }
        }

        Err(anyhow!("No probability output found"))
    }

    fn extract_from_value(&self, output: &DynValue) -> anyhow::Result<Option<f64>> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return Ok(class_one_probability(&dims, data));
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return self.extract_from_sequence_map(output).map(Some);
        }

        Ok(None)
    }

    /// Extract probability from seq(map(int64, float)) format
    fn extract_from_sequence_map(&self, output: &DynValue) -> anyhow::Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        let map_value = maps.first().ok_or_else(|| anyhow!("Empty sequence"))?;

        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

        if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
            return Ok(*prob as f64);
        }
        if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
            return Ok(1.0 - *prob as f64);
        }

        Err(anyhow!("No class probability found in map"))
    }
}

/// Dense f32 input row. Finite f64 values past the f32 range would reach the
/// model as infinities, so they are refused.
fn model_row(features: &FeatureVector) -> anyhow::Result<Vec<f32>> {
    let row = features.to_f32();
    let overflow = features
        .iter()
        .zip(&row)
        .find(|(_, encoded)| !encoded.is_finite());
    if let Some(((name, value), _)) = overflow {
        bail!("Feature {} = {} does not fit the f32 model input", name, value.as_f64());
    }
    Ok(row)
}

/// Class-1 probability from a `[batch, classes]` or `[classes]` tensor.
fn class_one_probability(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = match dims {
        [_, classes] | [classes] => *classes,
        _ => return None,
    };

    match classes {
        c if c >= 2 => data.get(1).map(|&v| v as f64),
        1 => data.first().map(|&v| v as f64),
        _ => None,
    }
}

impl RawScore {
    fn label(&self) -> Result<u8> {
        match self.label {
            Some(label) => u8::try_from(label).map_err(|_| {
                InferenceError::Prediction(format!("Model returned invalid label {}", label))
            }),
            // Binary argmax
            None => Ok(u8::from(self.probability > 0.5)),
        }
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<u8> {
        self.score(features).map_err(prediction_error)?.label()
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        self.score(features)
            .map(|score| score.probability)
            .map_err(prediction_error)
    }

    fn predict_with_proba(&self, features: &FeatureVector) -> Result<(u8, f64)> {
        let score = self.score(features).map_err(prediction_error)?;
        Ok((score.label()?, score.probability))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn prediction_error(err: anyhow::Error) -> InferenceError {
    InferenceError::Prediction(format!("{:#}", err))
}
