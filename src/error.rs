use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kernel::telemetry::logger::TelemetryError;

/// Failure taxonomy attached to every ErrorEvent (`details.category`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    InputError,
    ArtifactError,
    ConfigurationFault,
    InferenceFailure,
    TelemetryIoFailure,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::InputError => "input_error",
            FailureCategory::ArtifactError => "artifact_error",
            FailureCategory::ConfigurationFault => "configuration_fault",
            FailureCategory::InferenceFailure => "inference_failure",
            FailureCategory::TelemetryIoFailure => "telemetry_io_failure",
        }
    }
}

#[derive(Debug, Error)]
pub enum BrainError {
    /// Malformed image buffer (rank, channel count, length).
    #[error("invalid image input: {0}")]
    Input(String),

    /// Malformed or incompatible model artifact. Fatal to construction.
    #[error("model artifact error: {0}")]
    Artifact(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Forward pass failed.
    #[error("inference failure: {0}")]
    Inference(String),

    /// A planner could not build its template (e.g. malformed pose in env_state).
    #[error("planning failure: {0}")]
    Planning(String),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl BrainError {
    pub fn category(&self) -> FailureCategory {
        match self {
            BrainError::Input(_) => FailureCategory::InputError,
            BrainError::Artifact(_) => FailureCategory::ArtifactError,
            BrainError::Config(_) => FailureCategory::ConfigurationFault,
            BrainError::Inference(_) | BrainError::Planning(_) => FailureCategory::InferenceFailure,
            BrainError::Telemetry(_) => FailureCategory::TelemetryIoFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planning_is_an_inference_failure() {
        let err = BrainError::Planning("bad pose".into());
        assert_eq!(err.category(), FailureCategory::InferenceFailure);
        assert_eq!(err.to_string(), "planning failure: bad pose");
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&FailureCategory::TelemetryIoFailure).unwrap();
        assert_eq!(json, format!("\"{}\"", FailureCategory::TelemetryIoFailure.as_str()));
    }
}
