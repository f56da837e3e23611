//! Synchronization with the externally-owned replication task state machine.

use tracing::{debug, info};

use crate::clients::ReplicationClient;
use crate::error::{ErrorKind, HarnessResult};
use crate::harness_error;
use crate::retry::{RetryPolicy, retry};
use crate::types::TaskStatus;

/// Polls the task's status until it equals `expected`, through the retry executor.
///
/// Succeeds only on exact equality. No state ordering is assumed: if the task
/// is already past the expected state this exhausts and fails, so callers must
/// request states in the order the task actually transitions through them. On
/// exhaustion the surfaced error carries the last observed status.
pub async fn wait_for_task_status<R>(
    client: &R,
    policy: RetryPolicy,
    task: &str,
    expected: TaskStatus,
) -> HarnessResult<()>
where
    R: ReplicationClient,
{
    info!(task = %task, expected = %expected, "waiting for task status");

    retry(policy, || async {
        let status = client.task_status(task).await?;
        debug!(task = %task, status = %status, "observed task status");

        if status == expected {
            Ok(())
        } else {
            Err(harness_error!(
                ErrorKind::StatusMismatch,
                "task status did not match the expected status",
                format!("task `{task}` last observed `{status}`, expected `{expected}`")
            ))
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clients::memory::MemoryPipeline;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn succeeds_immediately_when_already_in_the_expected_status() {
        let pipeline = MemoryPipeline::new();
        pipeline.register_cdc_task("cdc").await;
        pipeline.pin_task_status("cdc", TaskStatus::Running).await;

        wait_for_task_status(&pipeline, fast_policy(), "cdc", TaskStatus::Running)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn exhausts_with_the_last_observed_status_in_the_detail() {
        let pipeline = MemoryPipeline::new();
        pipeline.register_cdc_task("cdc").await;
        pipeline.pin_task_status("cdc", TaskStatus::Starting).await;

        let error =
            wait_for_task_status(&pipeline, fast_policy(), "cdc", TaskStatus::Running)
                .await
                .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::StatusMismatch);
        assert!(error.detail().unwrap().contains("last observed `starting`"));
    }

    #[tokio::test]
    async fn unknown_task_surfaces_the_control_plane_error() {
        let pipeline = MemoryPipeline::new();

        let error =
            wait_for_task_status(&pipeline, fast_policy(), "missing", TaskStatus::Running)
                .await
                .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ControlPlaneError);
    }
}
