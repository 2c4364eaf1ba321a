use std::collections::HashMap;

use super::policies;
use super::types::{Observation, SubGoal};
use crate::error::BrainError;
use crate::kernel::label::{TaskKind, TaskLabel};

/// A registered planner for one task of the closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPolicy {
    kind: TaskKind,
}

impl TaskPolicy {
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn plan(&self, obs: &Observation<'_>) -> Result<Vec<SubGoal>, BrainError> {
        policies::plan(self.kind, obs)
    }
}

/// Immutable label -> planner table. Built once, no mutation API.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: HashMap<TaskKind, TaskPolicy>,
}

impl PolicyRegistry {
    pub fn new(kinds: impl IntoIterator<Item = TaskKind>) -> Self {
        let policies = kinds.into_iter().map(|kind| (kind, TaskPolicy { kind })).collect();
        Self { policies }
    }

    /// All five planners.
    pub fn standard() -> Self {
        Self::new(TaskKind::ALL)
    }

    /// `None` for `unknown`, for labels outside the closed set, and for kinds
    /// left out of this registry.
    pub fn get(&self, label: &TaskLabel) -> Option<&TaskPolicy> {
        match label {
            TaskLabel::Task(kind) => self.policies.get(kind),
            TaskLabel::Other(_) | TaskLabel::Unknown => None,
        }
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
