use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BrainError, FailureCategory};
use crate::kernel::label::{ProbabilityDistribution, TaskLabel};

pub type Metadata = Map<String, Value>;

// Wire shape: one flat JSON object per event.
// {"event_type": "...", "timestamp": "<RFC 3339 UTC>", ...variant fields}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    TaskDecision(TaskDecisionEvent),
    PolicyPlan(PolicyPlanEvent),
    Error(ErrorEvent),
}

/// Classifier output. `confidence` is always the raw arg-max probability,
/// even when `label` was gated to `unknown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDecisionEvent {
    pub timestamp: DateTime<Utc>,
    pub label: TaskLabel,
    pub probs: ProbabilityDistribution,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyPlanEvent {
    pub timestamp: DateTime<Utc>,
    pub task: TaskLabel,
    pub sub_goal_count: usize,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub message: String,
    pub details: Option<Metadata>,
}

impl TelemetryEvent {
    pub fn task_decision(label: TaskLabel, probs: ProbabilityDistribution, confidence: f64) -> Self {
        TelemetryEvent::TaskDecision(TaskDecisionEvent {
            timestamp: Utc::now(),
            label,
            probs,
            confidence,
        })
    }

    pub fn policy_plan(task: TaskLabel, sub_goal_count: usize, metadata: Option<Metadata>) -> Self {
        TelemetryEvent::PolicyPlan(PolicyPlanEvent {
            timestamp: Utc::now(),
            task,
            sub_goal_count,
            metadata,
        })
    }

    pub fn error(source: &str, message: impl Into<String>, details: Option<Metadata>) -> Self {
        TelemetryEvent::Error(ErrorEvent {
            timestamp: Utc::now(),
            source: source.to_string(),
            message: message.into(),
            details,
        })
    }

    /// ErrorEvent for a failure that is about to be re-raised.
    pub fn failure(source: &str, err: &BrainError) -> Self {
        Self::error(source, err.to_string(), Some(category_details(err.category())))
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            TelemetryEvent::TaskDecision(_) => "task_decision",
            TelemetryEvent::PolicyPlan(_) => "policy_plan",
            TelemetryEvent::Error(_) => "error",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TelemetryEvent::TaskDecision(e) => e.timestamp,
            TelemetryEvent::PolicyPlan(e) => e.timestamp,
            TelemetryEvent::Error(e) => e.timestamp,
        }
    }
}

pub fn category_details(category: FailureCategory) -> Metadata {
    let mut details = Metadata::new();
    details.insert("category".to_string(), Value::String(category.as_str().to_string()));
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::label::TaskKind;

    #[test]
    fn test_wire_shape_is_flat() {
        let event = TelemetryEvent::policy_plan(TaskLabel::Task(TaskKind::Cooking), 3, None);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], "policy_plan");
        assert_eq!(value["task"], "cooking");
        assert_eq!(value["sub_goal_count"], 3);
        assert!(value["metadata"].is_null());
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_failure_details_carry_category() {
        let err = BrainError::Input("rank 2".into());
        let event = TelemetryEvent::failure("vision::classifier", &err);
        match event {
            TelemetryEvent::Error(e) => {
                assert_eq!(e.message, "invalid image input: rank 2");
                assert_eq!(e.details.unwrap()["category"], "input_error");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
