use std::collections::HashMap;
use std::future::Future;

use bytes::Bytes;
use secrecy::SecretString;

use crate::error::HarnessResult;
use crate::types::{IteratorPosition, RecordPage, StartMode, TableStatistics, TaskStatus};

/// Client for the provisioning system that created the pipeline.
///
/// The harness treats provisioning as a black box reachable through a named
/// output set; this trait is the only surface it depends on.
pub trait ProvisioningClient {
    /// Returns the output map of the named deployment.
    ///
    /// Fails with a not-found error when the deployment is absent. Absence is
    /// fatal and never retried.
    fn deployment_outputs(
        &self,
        deployment: &str,
    ) -> impl Future<Output = HarnessResult<HashMap<String, String>>> + Send;
}

/// Client for the secret store holding the source credentials.
pub trait SecretsClient {
    /// Returns the secret string stored under the given reference.
    fn get_secret(
        &self,
        secret_ref: &str,
    ) -> impl Future<Output = HarnessResult<SecretString>> + Send;
}

/// Client for the source object store the replication engine ingests from.
pub trait ObjectStoreClient {
    /// Writes `body` verbatim at `key` in `bucket`.
    ///
    /// Writes are idempotent overwrites; implementations must not perform
    /// existence checks or conflict detection.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> impl Future<Output = HarnessResult<()>> + Send;
}

/// Client for the replication control plane.
///
/// The harness only transitions tasks via [`ReplicationClient::start_task`] and
/// [`ReplicationClient::stop_task`] and otherwise observes them read-only.
pub trait ReplicationClient {
    /// Requests that the task start in the given mode and returns the status
    /// the control plane reported for the request.
    fn start_task(
        &self,
        task: &str,
        mode: StartMode,
    ) -> impl Future<Output = HarnessResult<TaskStatus>> + Send;

    /// Requests that the task stop and returns the reported status.
    fn stop_task(&self, task: &str) -> impl Future<Output = HarnessResult<TaskStatus>> + Send;

    /// Returns the task's current status.
    fn task_status(&self, task: &str) -> impl Future<Output = HarnessResult<TaskStatus>> + Send;

    /// Returns the per-table replication counters of the task, in no
    /// particular order.
    fn table_statistics(
        &self,
        task: &str,
    ) -> impl Future<Output = HarnessResult<Vec<TableStatistics>>> + Send;
}

/// Client for the downstream append-only partitioned stream.
///
/// The `stream` argument is the identifier resolved from the deployment's
/// outputs, passed through verbatim. Deployments export it as an ARN, so
/// implementations must address the stream by ARN, not by name.
pub trait StreamClient {
    /// Resolves the stream's single partition and returns its identifier.
    fn resolve_shard(&self, stream: &str) -> impl Future<Output = HarnessResult<String>> + Send;

    /// Obtains an opaque cursor into the partition at the given position.
    fn shard_iterator(
        &self,
        stream: &str,
        shard: &str,
        position: IteratorPosition,
    ) -> impl Future<Output = HarnessResult<String>> + Send;

    /// Fetches a bounded page of records following the cursor.
    fn read_records(
        &self,
        cursor: &str,
        limit: usize,
    ) -> impl Future<Output = HarnessResult<RecordPage>> + Send;
}
