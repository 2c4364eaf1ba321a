//! Perception: frame normalization, model artifact loading and the gated
//! task classifier.

pub mod artifact;
pub mod classifier;
pub mod model;
pub mod preprocess;
