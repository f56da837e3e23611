//! Helpers for exercising the harness against the in-memory pipeline.

mod pipeline;

pub use pipeline::*;
