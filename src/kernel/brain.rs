use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::label::{ProbabilityDistribution, TaskLabel};
use super::telemetry::event::{category_details, Metadata, TelemetryEvent};
use super::telemetry::logger::TelemetryLogger;
use crate::config::BrainConfig;
use crate::error::{BrainError, FailureCategory};
use crate::planner::registry::PolicyRegistry;
use crate::planner::types::{Observation, StateMap, SubGoal};
use crate::vision::classifier::Classifier;
use crate::vision::preprocess::ImageInput;

pub const SOURCE: &str = "kernel::brain";

/// Output of one `decide` call. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub task: TaskLabel,
    pub probs: ProbabilityDistribution,
    pub sub_goals: Vec<SubGoal>,
    pub unknown: bool,
}

/// Decision pipeline: Classifier -> gate -> PolicyRegistry -> planner -> Decision,
/// with telemetry emitted at each decision point.
#[derive(Debug)]
pub struct HumanoidBrain {
    classifier: Classifier,
    registry: PolicyRegistry,
    telemetry: Option<Arc<TelemetryLogger>>,
}

impl HumanoidBrain {
    /// Pipeline with all five planners registered.
    pub fn new(classifier: Classifier, telemetry: Option<Arc<TelemetryLogger>>) -> Self {
        Self::with_registry(classifier, PolicyRegistry::standard(), telemetry)
    }

    pub fn with_registry(
        classifier: Classifier,
        registry: PolicyRegistry,
        telemetry: Option<Arc<TelemetryLogger>>,
    ) -> Self {
        info!(
            classes = classifier.classes().len(),
            planners = registry.len(),
            "humanoid brain ready"
        );
        Self {
            classifier,
            registry,
            telemetry,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// One frame in, one Decision out.
    ///
    /// Low confidence and a missing planner are data outcomes (`unknown = true`).
    /// Real failures are logged once as ErrorEvents and returned unchanged.
    pub fn decide(
        &self,
        image: &ImageInput,
        robot_state: &StateMap,
        env_state: &StateMap,
    ) -> Result<Decision, BrainError> {
        // === 1. CLASSIFY ===
        // The classifier records its own ErrorEvent; nothing more to add here.
        let prediction = self.classifier.predict(image)?;
        let label = prediction.label;
        let probs = prediction.probs;

        // === 2. GATE ===
        if label.is_unknown() {
            let mut metadata = Metadata::new();
            metadata.insert("reason".to_string(), Value::from("low_confidence"));
            self.emit(TelemetryEvent::policy_plan(TaskLabel::Unknown, 0, Some(metadata)))?;
            return Ok(Decision {
                task: TaskLabel::Unknown,
                probs,
                sub_goals: Vec::new(),
                unknown: true,
            });
        }

        // === 3/4. DISPATCH + PLAN (single error boundary) ===
        let observation = Observation {
            image,
            robot_state,
            env_state,
        };
        match self.dispatch(label, probs, &observation) {
            Ok(decision) => Ok(decision),
            Err(err) => {
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    fn dispatch(
        &self,
        label: TaskLabel,
        probs: ProbabilityDistribution,
        observation: &Observation<'_>,
    ) -> Result<Decision, BrainError> {
        let policy = match self.registry.get(&label) {
            Some(policy) => policy,
            None => {
                // Integration fault, not low confidence: same shape, different telemetry.
                warn!(label = %label, "no planner registered for label");
                let mut details = category_details(FailureCategory::ConfigurationFault);
                details.insert("label".to_string(), json!(label.as_str()));
                self.emit(TelemetryEvent::error(
                    SOURCE,
                    format!("No policy for label: {}", label),
                    Some(details),
                ))?;
                return Ok(Decision {
                    task: label,
                    probs,
                    sub_goals: Vec::new(),
                    unknown: true,
                });
            }
        };

        debug!(task = %policy.kind(), "planning");
        let sub_goals = policy.plan(observation)?;
        self.emit(TelemetryEvent::policy_plan(label.clone(), sub_goals.len(), None))?;

        Ok(Decision {
            task: label,
            probs,
            sub_goals,
            unknown: false,
        })
    }

    fn emit(&self, event: TelemetryEvent) -> Result<(), BrainError> {
        if let Some(telemetry) = &self.telemetry {
            telemetry.log_event(&event)?;
        }
        Ok(())
    }

    fn report_failure(&self, err: &BrainError) {
        if let Some(telemetry) = &self.telemetry {
            if let Err(log_err) = telemetry.log_event(&TelemetryEvent::failure(SOURCE, err)) {
                warn!("could not record decide failure ({}): {}", err, log_err);
            }
        }
    }
}

/// Factory: validates config, loads the classifier, registers all planners.
pub fn load_brain(
    config: &BrainConfig,
    telemetry: Option<Arc<TelemetryLogger>>,
) -> Result<HumanoidBrain, BrainError> {
    config.validate()?;
    let classifier = Classifier::load(
        &config.weights_path,
        &config.device,
        config.min_confidence,
        telemetry.clone(),
    )?;
    Ok(HumanoidBrain::new(classifier, telemetry))
}
