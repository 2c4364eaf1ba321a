use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::artifact::{validate_classes, ModelArtifact};
use super::model::{softmax, Device, PooledLinearHead, TaskModel};
use super::preprocess::{to_tensor, ImageInput};
use crate::config::validate_min_confidence;
use crate::error::BrainError;
use crate::kernel::label::{ProbabilityDistribution, TaskLabel};
use crate::kernel::telemetry::event::TelemetryEvent;
use crate::kernel::telemetry::logger::TelemetryLogger;

pub const SOURCE: &str = "vision::classifier";

/// Result of one `predict` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Arg-max class, or `Unknown` when the confidence gate fired.
    pub label: TaskLabel,
    pub probs: ProbabilityDistribution,
    /// Raw arg-max probability, reported even when gated.
    pub confidence: f64,
}

impl Prediction {
    /// EVALUATION ONLY: the arg-max class, ignoring the confidence gate.
    /// The decision pipeline never calls this.
    pub fn evaluation_label(&self) -> TaskLabel {
        match &self.label {
            TaskLabel::Unknown => self
                .probs
                .argmax()
                .map(|(name, _)| TaskLabel::from_name(name))
                .unwrap_or(TaskLabel::Unknown),
            label => label.clone(),
        }
    }
}

/// Wraps a pretrained model; turns an image into a gated label plus the full
/// distribution over the model's classes.
pub struct Classifier {
    classes: Vec<String>,
    model: Box<dyn TaskModel>,
    min_confidence: f64,
    telemetry: Option<Arc<TelemetryLogger>>,
}

impl Classifier {
    /// Loads the artifact and materializes it onto `device`. Any defect in the
    /// artifact or an unavailable device is an ArtifactError.
    pub fn load(
        weights: impl AsRef<Path>,
        device: &str,
        min_confidence: f64,
        telemetry: Option<Arc<TelemetryLogger>>,
    ) -> Result<Self, BrainError> {
        let weights = weights.as_ref();
        let device: Device = device.parse()?;
        let artifact = ModelArtifact::load(weights)?;
        let model = PooledLinearHead::from_state(&artifact.model_state, artifact.classes.len(), device)?;

        info!(
            weights = %weights.display(),
            %device,
            classes = artifact.classes.len(),
            min_confidence,
            "task classifier loaded"
        );
        Self::with_model(artifact.classes, Box::new(model), min_confidence, telemetry)
    }

    /// Any `TaskModel` implementation, e.g. a different architecture.
    pub fn with_model(
        classes: Vec<String>,
        model: Box<dyn TaskModel>,
        min_confidence: f64,
        telemetry: Option<Arc<TelemetryLogger>>,
    ) -> Result<Self, BrainError> {
        validate_min_confidence(min_confidence)?;
        validate_classes(&classes)?;
        if model.num_classes() != classes.len() {
            return Err(BrainError::Artifact(format!(
                "model produces {} scores for {} classes",
                model.num_classes(),
                classes.len()
            )));
        }

        Ok(Self {
            classes,
            model,
            min_confidence,
            telemetry,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Classifies one frame.
    ///
    /// Emits one TaskDecisionEvent on success. On failure emits one ErrorEvent
    /// and returns the original error unchanged.
    pub fn predict(&self, image: &ImageInput) -> Result<Prediction, BrainError> {
        match self.try_predict(image) {
            Ok(prediction) => Ok(prediction),
            Err(err) => {
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    fn try_predict(&self, image: &ImageInput) -> Result<Prediction, BrainError> {
        let tensor = to_tensor(image)?;
        let logits = self.model.forward(&tensor)?;
        if logits.len() != self.classes.len() {
            return Err(BrainError::Inference(format!(
                "model returned {} scores for {} classes",
                logits.len(),
                self.classes.len()
            )));
        }

        let probs = ProbabilityDistribution::from_entries(
            self.classes.iter().cloned().zip(softmax(&logits)).collect(),
        );
        let (best, confidence) = probs
            .argmax()
            .map(|(name, p)| (name.to_string(), p))
            .ok_or_else(|| BrainError::Inference("empty probability distribution".to_string()))?;

        // Confidence gate
        let label = if confidence < self.min_confidence {
            warn!(best = %best, confidence, threshold = self.min_confidence, "prediction gated to unknown");
            TaskLabel::Unknown
        } else {
            TaskLabel::from_name(&best)
        };
        debug!(label = %label, confidence, "prediction");

        if let Some(telemetry) = &self.telemetry {
            telemetry.log_event(&TelemetryEvent::task_decision(label.clone(), probs.clone(), confidence))?;
        }

        Ok(Prediction {
            label,
            probs,
            confidence,
        })
    }

    fn report_failure(&self, err: &BrainError) {
        if let Some(telemetry) = &self.telemetry {
            if let Err(log_err) = telemetry.log_event(&TelemetryEvent::failure(SOURCE, err)) {
                warn!("could not record classifier failure ({}): {}", err, log_err);
            }
        }
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("classes", &self.classes)
            .field("min_confidence", &self.min_confidence)
            .field("telemetry", &self.telemetry.is_some())
            .finish()
    }
}
