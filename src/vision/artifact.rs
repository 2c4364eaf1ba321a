use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::BrainError;
use crate::kernel::label::UNKNOWN_LABEL;

/// Opaque trained bundle: ordered class names plus a parameter blob.
/// Consumed here, never produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub classes: Vec<String>,
    pub model_state: Value,
}

#[derive(Deserialize)]
struct RawArtifact {
    classes: Option<Vec<String>>,
    model_state: Option<Value>,
}

impl ModelArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BrainError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| BrainError::Artifact(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
            .map_err(|e| BrainError::Artifact(format!("{}: {}", path.display(), strip_prefix(&e))))
    }

    pub fn from_json_str(content: &str) -> Result<Self, BrainError> {
        let raw: RawArtifact = serde_json::from_str(content)
            .map_err(|e| BrainError::Artifact(format!("not a model artifact: {}", e)))?;

        let classes = raw
            .classes
            .ok_or_else(|| BrainError::Artifact("missing required field `classes`".to_string()))?;
        let model_state = match raw.model_state {
            Some(Value::Null) | None => {
                return Err(BrainError::Artifact("missing required field `model_state`".to_string()))
            }
            Some(state) => state,
        };

        validate_classes(&classes)?;

        Ok(Self { classes, model_state })
    }
}

/// Class names must be non-empty, unique and never the reserved `unknown`.
pub fn validate_classes(classes: &[String]) -> Result<(), BrainError> {
    if classes.is_empty() {
        return Err(BrainError::Artifact("class list is empty".to_string()));
    }
    let mut seen = HashSet::new();
    for name in classes {
        if name.trim().is_empty() {
            return Err(BrainError::Artifact("class list contains an empty name".to_string()));
        }
        if name == UNKNOWN_LABEL {
            return Err(BrainError::Artifact("`unknown` is reserved and cannot be a class".to_string()));
        }
        if !seen.insert(name.as_str()) {
            return Err(BrainError::Artifact(format!("duplicate class name {:?}", name)));
        }
    }
    Ok(())
}

fn strip_prefix(err: &BrainError) -> String {
    match err {
        BrainError::Artifact(msg) => msg.clone(),
        other => other.to_string(),
    }
}
