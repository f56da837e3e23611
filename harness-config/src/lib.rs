//! Configuration loading for the pipeline verifier.
//!
//! Provides the runtime [`Environment`] detection, hierarchical configuration
//! loading with environment variable overrides, and the shared configuration
//! structures consumed by the verifier binary.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{LoadConfigError, load_config};
