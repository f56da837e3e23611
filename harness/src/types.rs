//! Core data types shared across the harness components.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifiers of the provisioned pipeline the harness drives.
///
/// Resolved once from the deployment's output set at startup and immutable for
/// the rest of the process lifetime.
#[derive(Debug, Clone)]
pub struct PipelineCoordinates {
    /// Identifier of the one-time bulk load replication task.
    pub full_load_task: String,
    /// Identifier of the continuous change-capture replication task.
    pub cdc_task: String,
    /// Identifier of the downstream stream the pipeline writes into.
    pub stream: String,
    /// Reference to the secret holding the source store credentials.
    pub source_secret: String,
}

/// Source object store layout, resolved from the credentials secret.
///
/// Read-only after resolution; used to compute injection paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCredentials {
    /// Name of the source bucket.
    pub bucket_name: String,
    /// Prefix under which the replication engine watches for input files.
    pub bucket_folder: String,
    /// Sub-prefix, relative to [`Self::bucket_folder`], holding change-event batches.
    pub change_data: String,
}

/// Observed status of an externally-owned replication task.
///
/// The harness never owns the task state machine. It only requests start/stop
/// transitions and synchronizes with the resulting states by polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Ready,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
    /// Any status the control plane reports that the harness does not enumerate.
    Other(String),
}

impl TaskStatus {
    /// Returns the wire representation of this status.
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Ready => "ready",
            TaskStatus::Starting => "starting",
            TaskStatus::Running => "running",
            TaskStatus::Stopping => "stopping",
            TaskStatus::Stopped => "stopped",
            TaskStatus::Failed => "failed",
            TaskStatus::Other(status) => status,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TaskStatus {
    fn from(status: &str) -> Self {
        match status {
            "ready" => TaskStatus::Ready,
            "starting" => TaskStatus::Starting,
            "running" => TaskStatus::Running,
            "stopping" => TaskStatus::Stopping,
            "stopped" => TaskStatus::Stopped,
            "failed" => TaskStatus::Failed,
            other => TaskStatus::Other(other.to_string()),
        }
    }
}

/// Mode in which a replication task is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Start the task from the beginning.
    Start,
    /// Resume a previously stopped task.
    Resume,
}

impl StartMode {
    /// Returns the wire representation of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            StartMode::Start => "start-replication",
            StartMode::Resume => "resume-processing",
        }
    }
}

/// A single record observed on the downstream stream.
///
/// Records are immutable once appended. Ordering within a partition is arrival
/// order; across partitions no ordering is guaranteed.
#[derive(Debug, Clone)]
pub struct StreamRecord {
    /// Raw change-event payload.
    pub data: Bytes,
    /// Partition key the record was appended under.
    pub partition_key: String,
    /// Approximate arrival timestamp assigned by the stream.
    pub arrival: DateTime<Utc>,
}

/// One page of a paginated partition read.
#[derive(Debug, Clone)]
pub struct RecordPage {
    /// Records in this page, in arrival order.
    pub records: Vec<StreamRecord>,
    /// Cursor for the next page, or [`None`] when the partition is exhausted.
    pub next: Option<String>,
}

/// Position a partition cursor is obtained at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorPosition {
    /// The oldest retained record of the partition.
    TrimHorizon,
    /// Just past the most recent record of the partition.
    Latest,
}

/// Per-table replication counters reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatistics {
    pub schema_name: String,
    pub table_name: String,
    /// Rows transferred by the bulk load.
    pub full_load_rows: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
}
