pub mod config;
pub mod error;
pub mod kernel;
pub mod vision;
pub mod planner;
pub mod eval;

// Crate-root shortcuts for the public surface
pub use config::BrainConfig;
pub use error::{BrainError, FailureCategory};
pub use kernel::brain::{load_brain, Decision, HumanoidBrain};
pub use kernel::label::{ProbabilityDistribution, TaskKind, TaskLabel};
pub use kernel::telemetry::logger::TelemetryLogger;
pub use vision::classifier::{Classifier, Prediction};
