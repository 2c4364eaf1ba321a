use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::preprocess::InputTensor;
use crate::error::BrainError;

/// Forward pass seam. Parameters are read-only after construction, so one
/// model may serve concurrent `forward` calls.
pub trait TaskModel: Send + Sync {
    /// Raw class scores, one per class in artifact order.
    fn forward(&self, input: &InputTensor) -> Result<Vec<f32>, BrainError>;

    fn num_classes(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
}

impl FromStr for Device {
    type Err = BrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "cpu" => Ok(Device::Cpu),
            other if other.starts_with("cuda") || other == "mps" => Err(BrainError::Artifact(format!(
                "cannot materialize model onto device {:?}: only cpu is available",
                s
            ))),
            _ => Err(BrainError::Artifact(format!("unrecognized device {:?}", s))),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
        }
    }
}

const MAX_GRID: usize = 224;

#[derive(Deserialize)]
struct PooledLinearState {
    grid: usize,
    weight: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

/// Built-in architecture: adaptive average pooling of each channel onto a
/// `grid × grid` cell lattice, followed by one linear layer.
///
/// features = 3·grid², logits = weight · features + bias
#[derive(Debug, Clone)]
pub struct PooledLinearHead {
    grid: usize,
    weight: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

impl PooledLinearHead {
    pub fn from_state(state: &Value, num_classes: usize, device: Device) -> Result<Self, BrainError> {
        let state: PooledLinearState = serde_json::from_value(state.clone())
            .map_err(|e| BrainError::Artifact(format!("model_state does not fit pooled linear head: {}", e)))?;

        if state.grid == 0 || state.grid > MAX_GRID {
            return Err(BrainError::Artifact(format!(
                "grid must be within 1..={}, got {}",
                MAX_GRID, state.grid
            )));
        }
        let features = 3 * state.grid * state.grid;
        if state.weight.len() != num_classes {
            return Err(BrainError::Artifact(format!(
                "weight has {} rows for {} classes",
                state.weight.len(),
                num_classes
            )));
        }
        if let Some((row, w)) = state.weight.iter().enumerate().find(|(_, w)| w.len() != features) {
            return Err(BrainError::Artifact(format!(
                "weight row {} has {} columns, expected {}",
                row,
                w.len(),
                features
            )));
        }
        if state.bias.len() != num_classes {
            return Err(BrainError::Artifact(format!(
                "bias has {} entries for {} classes",
                state.bias.len(),
                num_classes
            )));
        }
        let finite = state.weight.iter().flatten().chain(state.bias.iter()).all(|v| v.is_finite());
        if !finite {
            return Err(BrainError::Artifact("parameters contain non-finite values".to_string()));
        }

        tracing::debug!(grid = state.grid, classes = num_classes, %device, "pooled linear head materialized");
        Ok(Self {
            grid: state.grid,
            weight: state.weight,
            bias: state.bias,
        })
    }

    fn pool(&self, input: &InputTensor) -> Vec<f32> {
        let g = self.grid;
        let mut features = Vec::with_capacity(input.channels * g * g);
        for c in 0..input.channels {
            for gy in 0..g {
                let (y0, y1) = cell_bounds(gy, g, input.height);
                for gx in 0..g {
                    let (x0, x1) = cell_bounds(gx, g, input.width);
                    let mut sum = 0.0f32;
                    for y in y0..y1 {
                        for x in x0..x1 {
                            sum += input.at(c, y, x);
                        }
                    }
                    features.push(sum / ((y1 - y0) * (x1 - x0)) as f32);
                }
            }
        }
        features
    }
}

/// Same partition as adaptive average pooling: [floor(i·n/g), ceil((i+1)·n/g)).
fn cell_bounds(i: usize, g: usize, n: usize) -> (usize, usize) {
    let start = i * n / g;
    let end = ((i + 1) * n + g - 1) / g;
    (start, end.max(start + 1).min(n))
}

impl TaskModel for PooledLinearHead {
    fn forward(&self, input: &InputTensor) -> Result<Vec<f32>, BrainError> {
        if input.channels != 3 {
            return Err(BrainError::Inference(format!("expected 3 channels, got {}", input.channels)));
        }
        if input.height < self.grid || input.width < self.grid {
            return Err(BrainError::Inference(format!(
                "input {}x{} is smaller than pooling grid {}",
                input.width, input.height, self.grid
            )));
        }

        let features = self.pool(input);
        let logits: Vec<f32> = self
            .weight
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(&features).map(|(w, f)| w * f).sum::<f32>() + b)
            .collect();

        if logits.iter().any(|v| !v.is_finite()) {
            return Err(BrainError::Inference("forward pass produced non-finite scores".to_string()));
        }
        Ok(logits)
    }

    fn num_classes(&self) -> usize {
        self.bias.len()
    }
}

/// Numerically stable softmax in f64.
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&v| (v as f64 - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
