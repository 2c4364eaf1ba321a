//! Structured decision telemetry.
//!
//! # INVARIANT
//! Telemetry is a side-effect layer. Events flow sideways out of each stage and
//! are never read back inside decision logic (Classifier, Registry, Planners).
//! Replay and metrics exist for observability and offline verification only.

pub mod event;
pub mod logger;
pub mod metrics;
