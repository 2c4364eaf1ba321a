pub mod brain;
pub mod label;
pub mod telemetry;
