//! Offline accuracy measurement against a labeled dataset.
//!
//! Evaluation mode bypasses the confidence gate (see
//! `Prediction::evaluation_label`). It is read-only consumption of `predict`
//! and never feeds back into `decide`.

pub mod dataset;
pub mod runner;
