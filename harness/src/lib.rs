//! Verification harness for a managed data-replication pipeline.
//!
//! Drives an already-provisioned pipeline (source object store → replication
//! engine → partitioned stream) end to end: injects fixture files, starts and
//! stops replication tasks, synchronizes with their asynchronous state
//! transitions, and polls the downstream stream to confirm that the expected
//! change events arrived within a bounded window.

pub mod clients;
pub mod error;
pub mod fixtures;
pub mod inject;
mod macros;
pub mod resolve;
pub mod retry;
pub mod scenario;
pub mod stats;
pub mod stream;
pub mod task;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
