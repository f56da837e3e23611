//! Scenario orchestration for the bulk-load and change-capture verifications.
//!
//! Each scenario is a fixed linear sequence with no branching and no retries at
//! this level; retrying belongs to the task waiter and the stream aggregator.
//! The two scenarios run strictly sequentially on a single logical thread,
//! sharing the same stream and credential handles.

use chrono::Utc;
use tracing::info;

use crate::clients::{ObjectStoreClient, ReplicationClient, StreamClient};
use crate::error::HarnessResult;
use crate::fixtures;
use crate::inject::SourceInjector;
use crate::retry::RetryPolicy;
use crate::stats::table_statistics;
use crate::stream::collect_events;
use crate::task::wait_for_task_status;
use crate::types::{
    PipelineCoordinates, SourceCredentials, StartMode, StreamRecord, TableStatistics, TaskStatus,
};

/// Outcome of one scenario run: the collected events and the sorted statistics.
#[derive(Debug)]
pub struct ScenarioReport {
    /// Stream events observed within the scenario's verification window.
    pub events: Vec<StreamRecord>,
    /// Per-table counters, sorted by `(schema_name, table_name)`.
    pub statistics: Vec<TableStatistics>,
}

/// Drives and verifies an already-provisioned replication pipeline.
///
/// Constructed once at startup from the resolved coordinates and credentials;
/// all state is read-only afterwards except the explicit start/stop requests
/// sent to the control plane.
#[derive(Debug)]
pub struct Harness<R, L, O> {
    replication: R,
    stream: L,
    injector: SourceInjector<O>,
    coordinates: PipelineCoordinates,
    policy: RetryPolicy,
}

impl<R, L, O> Harness<R, L, O>
where
    R: ReplicationClient,
    L: StreamClient,
    O: ObjectStoreClient,
{
    /// Creates a harness over the given clients and resolved pipeline identity.
    pub fn new(
        replication: R,
        stream: L,
        store: O,
        coordinates: PipelineCoordinates,
        credentials: SourceCredentials,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            replication,
            stream,
            injector: SourceInjector::new(store, credentials),
            coordinates,
            policy,
        }
    }

    /// Runs the bulk-load scenario followed by the change-capture scenario.
    pub async fn run(&self) -> HarnessResult<()> {
        self.run_full_load().await?;
        self.run_change_capture().await?;

        Ok(())
    }

    /// Bulk-load scenario.
    ///
    /// Injects the three table snapshots, starts the bulk load task, waits for
    /// it to self-terminate, and verifies the events that arrived after the
    /// pre-injection timestamp floor.
    pub async fn run_full_load(&self) -> HarnessResult<ScenarioReport> {
        info!("starting full load scenario");

        let since = Utc::now();

        self.injector
            .inject(fixtures::EMPLOYEE_SNAPSHOT_PATH, fixtures::EMPLOYEE_SNAPSHOT)
            .await?;
        self.injector
            .inject(
                fixtures::DEPARTMENT_SNAPSHOT_PATH,
                fixtures::DEPARTMENT_SNAPSHOT,
            )
            .await?;
        self.injector
            .inject(fixtures::PROJECT_SNAPSHOT_PATH, fixtures::PROJECT_SNAPSHOT)
            .await?;

        let task = &self.coordinates.full_load_task;
        let status = self.replication.start_task(task, StartMode::Start).await?;
        info!(task = %task, status = %status, "started full load task");

        // Bulk loads are terminating batch jobs: completion is observed as the
        // task stopping on its own.
        wait_for_task_status(&self.replication, self.policy, task, TaskStatus::Stopped).await?;

        let events = collect_events(
            &self.stream,
            self.policy,
            &self.coordinates.stream,
            fixtures::FULL_LOAD_EXPECTED_EVENTS,
            since,
        )
        .await?;

        let statistics = self.report_statistics(task).await?;

        info!(events = events.len(), "full load scenario finished");

        Ok(ScenarioReport { events, statistics })
    }

    /// Change-capture scenario.
    ///
    /// Starts the capture task and gates on `running` before timestamping the
    /// verification window: a task that has not started capturing yet must not
    /// be confused with one that has caught up. Injection happens while the
    /// task runs, and the task is explicitly stopped afterwards.
    pub async fn run_change_capture(&self) -> HarnessResult<ScenarioReport> {
        info!("starting change capture scenario");

        let task = &self.coordinates.cdc_task;
        let status = self.replication.start_task(task, StartMode::Start).await?;
        info!(task = %task, status = %status, "started change capture task");

        wait_for_task_status(&self.replication, self.policy, task, TaskStatus::Running).await?;

        let since = Utc::now();

        self.injector
            .inject_change_batch(fixtures::CHANGE_BATCH_1_FILE, fixtures::CHANGE_BATCH_1)
            .await?;
        self.injector
            .inject_change_batch(fixtures::CHANGE_BATCH_2_FILE, fixtures::CHANGE_BATCH_2)
            .await?;

        let events = collect_events(
            &self.stream,
            self.policy,
            &self.coordinates.stream,
            fixtures::CDC_EXPECTED_EVENTS,
            since,
        )
        .await?;

        let statistics = self.report_statistics(task).await?;

        self.replication.stop_task(task).await?;
        wait_for_task_status(&self.replication, self.policy, task, TaskStatus::Stopped).await?;

        info!(events = events.len(), "change capture scenario finished");

        Ok(ScenarioReport { events, statistics })
    }

    async fn report_statistics(&self, task: &str) -> HarnessResult<Vec<TableStatistics>> {
        let statistics = table_statistics(&self.replication, task).await?;

        for row in &statistics {
            info!(
                schema = %row.schema_name,
                table = %row.table_name,
                full_load_rows = row.full_load_rows,
                inserts = row.inserts,
                updates = row.updates,
                deletes = row.deletes,
                "table statistics"
            );
        }

        Ok(statistics)
    }
}
