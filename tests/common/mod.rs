#![allow(dead_code)]

use humanoid_brain::config::{TelemetryConfig, TASK_LABELS};
use humanoid_brain::kernel::brain::HumanoidBrain;
use humanoid_brain::kernel::telemetry::logger::TelemetryLogger;
use humanoid_brain::vision::classifier::Classifier;
use humanoid_brain::vision::preprocess::{ImageInput, PixelBuffer};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Artifact whose head ignores the image: zero weights, bias = ln(p), so the
/// softmax reproduces `probs` for every frame.
pub fn write_fixed_artifact(dir: &Path, classes: &[&str], probs: &[f64]) -> PathBuf {
    assert_eq!(classes.len(), probs.len());
    let weight: Vec<Vec<f32>> = classes.iter().map(|_| vec![0.0; 3]).collect();
    let bias: Vec<f32> = probs.iter().map(|p| p.ln() as f32).collect();
    let artifact = json!({
        "classes": classes,
        "model_state": { "grid": 1, "weight": weight, "bias": bias }
    });
    let path = dir.join("artifact.json");
    std::fs::write(&path, serde_json::to_string(&artifact).unwrap()).unwrap();
    path
}

/// Five-class distribution with `top` on `winner` and the rest spread evenly.
pub fn peaked(winner: &str, top: f64) -> Vec<f64> {
    let rest = (1.0 - top) / (TASK_LABELS.len() - 1) as f64;
    TASK_LABELS.iter().map(|c| if *c == winner { top } else { rest }).collect()
}

// Field order matters: the logger is released before the directory is removed.
pub struct Harness {
    pub telemetry: Arc<TelemetryLogger>,
    pub telemetry_path: PathBuf,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let telemetry_path = dir.path().join("telemetry").join("events.jsonl");
        let telemetry = Arc::new(TelemetryLogger::new(&TelemetryConfig::jsonl(&telemetry_path)).unwrap());
        Self {
            telemetry,
            telemetry_path,
            dir,
        }
    }

    pub fn classifier(&self, classes: &[&str], probs: &[f64], min_confidence: f64) -> Classifier {
        let weights = write_fixed_artifact(self.dir.path(), classes, probs);
        Classifier::load(&weights, "cpu", min_confidence, Some(self.telemetry.clone())).unwrap()
    }

    pub fn brain(&self, classes: &[&str], probs: &[f64], min_confidence: f64) -> HumanoidBrain {
        HumanoidBrain::new(
            self.classifier(classes, probs, min_confidence),
            Some(self.telemetry.clone()),
        )
    }

    pub fn events(&self) -> Vec<humanoid_brain::kernel::telemetry::event::TelemetryEvent> {
        humanoid_brain::kernel::telemetry::logger::read_events(&self.telemetry_path).unwrap()
    }
}

pub fn frame() -> ImageInput {
    PixelBuffer::filled(32, 24, [120, 80, 40]).into()
}
