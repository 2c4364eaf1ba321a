pub mod policies;
pub mod registry;
pub mod types;
