use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::BrainError;
use crate::vision::preprocess::ImageInput;

/// Free-form robot / environment context. Ordered so serialization is stable.
pub type StateMap = BTreeMap<String, Value>;

/// Everything a planner may look at for one decision. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub image: &'a ImageInput,
    pub robot_state: &'a StateMap,
    pub env_state: &'a StateMap,
}

impl<'a> Observation<'a> {
    /// Pose stored under `key` in env_state, passed through as given. Absent or
    /// null means "resolve at execution time"; any non-object value is rejected.
    pub fn env_pose(&self, key: &str) -> Result<Option<Pose>, BrainError> {
        match self.env_state.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(fields)) => Ok(Some(Pose(fields.clone()))),
            Some(other) => Err(BrainError::Planning(format!(
                "env_state.{} is not a pose object: {}",
                key, other
            ))),
        }
    }
}

/// 6-DOF pose as the environment reports it. The layout (euler, quaternion,
/// position/orientation, extra frame ids) belongs to the motion stack and is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pose(pub Map<String, Value>);

impl Pose {
    /// Position in meters, orientation as roll/pitch/yaw in radians.
    pub fn new(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        let mut fields = Map::new();
        for (key, value) in [("x", x), ("y", y), ("z", z), ("roll", roll), ("pitch", pitch), ("yaw", yaw)] {
            fields.insert(key.to_string(), Value::from(value));
        }
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubGoalKind {
    Move,
    Grasp,
    Wipe,
    Place,
}

/// Symbolic instruction for the downstream motion stack. Sequence order is
/// part of the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubGoal {
    #[serde(rename = "type")]
    pub kind: SubGoalKind,
    pub target_frame: String,
    pub pose: Option<Pose>,
    pub params: Map<String, Value>,
}

impl SubGoal {
    pub fn new(kind: SubGoalKind, target_frame: &str, pose: Option<Pose>) -> Self {
        Self {
            kind,
            target_frame: target_frame.to_string(),
            pose,
            params: Map::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}
