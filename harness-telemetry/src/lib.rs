//! Telemetry initialization for the pipeline verifier.

pub mod tracing;
