use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::BrainError;
use crate::kernel::label::TaskKind;

/// Wire names of the closed task set, in `TaskKind::ALL` order.
pub const TASK_LABELS: [&str; 5] = [
    TaskKind::ALL[0].as_str(),
    TaskKind::ALL[1].as_str(),
    TaskKind::ALL[2].as_str(),
    TaskKind::ALL[3].as_str(),
    TaskKind::ALL[4].as_str(),
];

pub const DEFAULT_DEVICE: &str = "cpu";
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.60;
pub const DEFAULT_WEIGHTS_PATH: &str = "task_classifier.json";

/// (width, height) of the tensor fed to the model.
pub const INPUT_SIZE: (u32, u32) = (224, 224);
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

const ENV_WEIGHTS: &str = "HUMANOID_BRAIN_WEIGHTS";
const ENV_DEVICE: &str = "HUMANOID_BRAIN_DEVICE";
const ENV_MIN_CONFIDENCE: &str = "HUMANOID_BRAIN_MIN_CONFIDENCE";
const ENV_TELEMETRY_JSONL: &str = "HUMANOID_BRAIN_TELEMETRY_JSONL";
const ENV_TELEMETRY_STDOUT: &str = "HUMANOID_BRAIN_TELEMETRY_STDOUT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Append-only JSONL log. `None` disables the durable sink.
    pub jsonl_path: Option<PathBuf>,
    pub echo_console: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            jsonl_path: None,
            echo_console: true,
        }
    }
}

impl TelemetryConfig {
    /// No sinks at all. Every `log_event` is a no-op.
    pub fn silent() -> Self {
        Self {
            jsonl_path: None,
            echo_console: false,
        }
    }

    pub fn jsonl(path: impl Into<PathBuf>) -> Self {
        Self {
            jsonl_path: Some(path.into()),
            echo_console: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    pub weights_path: PathBuf,
    pub device: String,
    pub min_confidence: f64,
    pub telemetry: TelemetryConfig,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            device: DEFAULT_DEVICE.to_string(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl BrainConfig {
    /// Defaults overlaid with `HUMANOID_BRAIN_*` environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var(ENV_WEIGHTS) {
            config.weights_path = PathBuf::from(path);
        }
        if let Ok(device) = std::env::var(ENV_DEVICE) {
            config.device = device;
        }
        if let Ok(raw) = std::env::var(ENV_MIN_CONFIDENCE) {
            config.min_confidence = raw.trim().parse().map_err(|_| {
                BrainError::Config(format!("{} is not a number: {:?}", ENV_MIN_CONFIDENCE, raw))
            })?;
        }
        if let Ok(path) = std::env::var(ENV_TELEMETRY_JSONL) {
            if !path.trim().is_empty() {
                config.telemetry.jsonl_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(raw) = std::env::var(ENV_TELEMETRY_STDOUT) {
            config.telemetry.echo_console = parse_flag(&raw).ok_or_else(|| {
                BrainError::Config(format!("{} must be a boolean flag: {:?}", ENV_TELEMETRY_STDOUT, raw))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BrainError> {
        validate_min_confidence(self.min_confidence)
    }
}

pub(crate) fn validate_min_confidence(min_confidence: f64) -> Result<(), BrainError> {
    if !min_confidence.is_finite() || !(0.0..=1.0).contains(&min_confidence) {
        return Err(BrainError::Config(format!(
            "min_confidence must be within [0, 1], got {}",
            min_confidence
        )));
    }
    Ok(())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
