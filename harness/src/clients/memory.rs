//! In-memory emulation of the whole pipeline for testing and development.
//!
//! [`MemoryPipeline`] stands in for every external collaborator at once: the
//! provisioning outputs, the secret store, the source object store, the
//! replication control plane, and the downstream stream. Starting the full-load
//! task synchronously replays the snapshot objects into the stream, and a
//! running change-capture task turns change-batch writes into stream records at
//! write time, which is enough to exercise the harness end to end without any
//! cloud dependency. All data is held in memory and lost when the process
//! terminates.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde_json::json;
use tokio::sync::Mutex;

use crate::bail;
use crate::clients::{
    ObjectStoreClient, ProvisioningClient, ReplicationClient, SecretsClient, StreamClient,
};
use crate::error::{ErrorKind, HarnessResult};
use crate::types::{
    IteratorPosition, RecordPage, SourceCredentials, StartMode, StreamRecord, TableStatistics,
    TaskStatus,
};

/// Identifier of the emulated stream's single shard.
const SHARD_ID: &str = "shardId-000000000000";

/// Kind of replication work an emulated task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskKind {
    FullLoad,
    Cdc,
}

#[derive(Debug)]
struct TaskState {
    kind: TaskKind,
    status: TaskStatus,
    /// Pinned tasks ignore start/stop requests and report a fixed status.
    pinned: bool,
    statistics: Vec<TableStatistics>,
}

#[derive(Debug, Default)]
struct Inner {
    deployments: HashMap<String, HashMap<String, String>>,
    secrets: HashMap<String, String>,
    layout: Option<SourceCredentials>,
    /// bucket -> key -> body.
    objects: HashMap<String, HashMap<String, Bytes>>,
    tasks: HashMap<String, TaskState>,
    stream: Option<String>,
    records: Vec<StreamRecord>,
    shard_open: bool,
}

/// In-memory pipeline emulation implementing every client trait.
#[derive(Debug, Clone)]
pub struct MemoryPipeline {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryPipeline {
    /// Creates an empty pipeline with an open single-shard stream.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                shard_open: true,
                ..Inner::default()
            })),
        }
    }

    /// Registers a deployment and its output map.
    pub async fn register_deployment(
        &self,
        deployment: &str,
        outputs: HashMap<String, String>,
    ) {
        let mut inner = self.inner.lock().await;
        inner.deployments.insert(deployment.to_string(), outputs);
    }

    /// Registers a secret value under the given reference.
    pub async fn register_secret(&self, secret_ref: &str, value: &str) {
        let mut inner = self.inner.lock().await;
        inner.secrets.insert(secret_ref.to_string(), value.to_string());
    }

    /// Declares the source layout the emulated replication engine watches.
    pub async fn set_source_layout(&self, credentials: SourceCredentials) {
        let mut inner = self.inner.lock().await;
        inner.layout = Some(credentials);
    }

    /// Registers a bulk-load task in the `ready` state.
    pub async fn register_full_load_task(&self, task: &str) {
        self.register_task(task, TaskKind::FullLoad).await;
    }

    /// Registers a change-capture task in the `ready` state.
    pub async fn register_cdc_task(&self, task: &str) {
        self.register_task(task, TaskKind::Cdc).await;
    }

    async fn register_task(&self, task: &str, kind: TaskKind) {
        let mut inner = self.inner.lock().await;
        inner.tasks.insert(
            task.to_string(),
            TaskState {
                kind,
                status: TaskStatus::Ready,
                pinned: false,
                statistics: Vec::new(),
            },
        );
    }

    /// Pins a task to a fixed status, making it ignore start/stop requests.
    pub async fn pin_task_status(&self, task: &str, status: TaskStatus) {
        let mut inner = self.inner.lock().await;
        if let Some(state) = inner.tasks.get_mut(task) {
            state.status = status;
            state.pinned = true;
        }
    }

    /// Registers the stream identifier the emulation answers for.
    pub async fn register_stream(&self, stream: &str) {
        let mut inner = self.inner.lock().await;
        inner.stream = Some(stream.to_string());
    }

    /// Closes the shard so that readers observe cursor exhaustion at the tail.
    pub async fn close_shard(&self) {
        let mut inner = self.inner.lock().await;
        inner.shard_open = false;
    }

    /// Appends a raw record with an explicit arrival timestamp.
    pub async fn append_record(
        &self,
        partition_key: &str,
        data: Bytes,
        arrival: DateTime<Utc>,
    ) {
        let mut inner = self.inner.lock().await;
        inner.records.push(StreamRecord {
            data,
            partition_key: partition_key.to_string(),
            arrival,
        });
    }

    /// Returns a snapshot of all records appended to the stream so far.
    pub async fn records(&self) -> Vec<StreamRecord> {
        let inner = self.inner.lock().await;
        inner.records.clone()
    }

    /// Returns the stored body of an object, if present.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        let inner = self.inner.lock().await;
        inner
            .objects
            .get(bucket)
            .and_then(|bucket| bucket.get(key))
            .cloned()
    }
}

impl Default for MemoryPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn append(&mut self, partition_key: String, data: Bytes) {
        self.records.push(StreamRecord {
            data,
            partition_key,
            arrival: Utc::now(),
        });
    }

    fn append_control(&mut self, schema: &str, table: &str, operation: &str) {
        let payload = json!({
            "record_type": "control",
            "operation": operation,
            "schema_name": schema,
            "table_name": table,
        });
        self.append(format!("{schema}.{table}"), Bytes::from(payload.to_string()));
    }

    fn append_data(&mut self, schema: &str, table: &str, operation: &str, row: &str) {
        let payload = json!({
            "record_type": "data",
            "operation": operation,
            "schema_name": schema,
            "table_name": table,
            "row": row,
        });
        self.append(format!("{schema}.{table}"), Bytes::from(payload.to_string()));
    }

    fn statistics_row<'a>(
        statistics: &'a mut Vec<TableStatistics>,
        schema: &str,
        table: &str,
    ) -> &'a mut TableStatistics {
        let position = statistics
            .iter()
            .position(|row| row.schema_name == schema && row.table_name == table)
            .unwrap_or_else(|| {
                statistics.push(TableStatistics {
                    schema_name: schema.to_string(),
                    table_name: table.to_string(),
                    full_load_rows: 0,
                    inserts: 0,
                    updates: 0,
                    deletes: 0,
                });
                statistics.len() - 1
            });
        &mut statistics[position]
    }

    /// Replays every snapshot object under the watched prefix into the stream.
    ///
    /// Each snapshot file produces two control records followed by one data
    /// record per row, mirroring how the replication engine recreates the
    /// target table before loading it.
    fn run_full_load(&mut self, task: &str) {
        let Some(layout) = self.layout.clone() else {
            return;
        };

        let folder_prefix = format!("{}/", layout.bucket_folder);
        let change_prefix = format!("{}/{}/", layout.bucket_folder, layout.change_data);

        let mut snapshots: Vec<(String, Bytes)> = self
            .objects
            .get(&layout.bucket_name)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|(key, _)| {
                        key.starts_with(&folder_prefix) && !key.starts_with(&change_prefix)
                    })
                    .map(|(key, body)| (key.clone(), body.clone()))
                    .collect()
            })
            .unwrap_or_default();
        snapshots.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, body) in snapshots {
            let relative = &key[folder_prefix.len()..];
            let mut parts = relative.split('/');
            let (Some(schema), Some(table)) = (parts.next(), parts.next()) else {
                continue;
            };
            let (schema, table) = (schema.to_string(), table.to_string());

            self.append_control(&schema, &table, "drop-table");
            self.append_control(&schema, &table, "create-table");

            let content = String::from_utf8_lossy(&body).into_owned();
            let mut rows = 0u64;
            for line in content.lines().filter(|line| !line.trim().is_empty()) {
                self.append_data(&schema, &table, "load", line);
                rows += 1;
            }

            if let Some(state) = self.tasks.get_mut(task) {
                let row = Self::statistics_row(&mut state.statistics, &schema, &table);
                row.full_load_rows += rows;
            }
        }
    }

    /// Turns one change-event batch file into stream records.
    ///
    /// Each batch produces one control record per distinct table it touches,
    /// followed by one data record per operation, in file order. Lines are
    /// `OPERATION,table,schema,fields...`.
    fn apply_change_batch(&mut self, task: &str, body: &Bytes) {
        let content = String::from_utf8_lossy(body).into_owned();

        let mut operations = Vec::new();
        let mut tables: Vec<(String, String)> = Vec::new();
        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            let mut fields = line.splitn(4, ',');
            let (Some(operation), Some(table), Some(schema)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            let key = (schema.to_string(), table.to_string());
            if !tables.contains(&key) {
                tables.push(key);
            }
            operations.push((
                operation.to_lowercase(),
                table.to_string(),
                schema.to_string(),
                line.to_string(),
            ));
        }

        for (schema, table) in &tables {
            self.append_control(schema, table, "create-table");
        }

        for (operation, table, schema, line) in operations {
            self.append_data(&schema, &table, &operation, &line);

            if let Some(state) = self.tasks.get_mut(task) {
                let row = Self::statistics_row(&mut state.statistics, &schema, &table);
                match operation.as_str() {
                    "insert" => row.inserts += 1,
                    "update" => row.updates += 1,
                    "delete" => row.deletes += 1,
                    _ => {}
                }
            }
        }
    }

    /// Returns the identifier of the running change-capture task, if any.
    fn running_cdc_task(&self) -> Option<String> {
        self.tasks.iter().find_map(|(id, state)| {
            (state.kind == TaskKind::Cdc && state.status == TaskStatus::Running)
                .then(|| id.clone())
        })
    }
}

impl ProvisioningClient for MemoryPipeline {
    async fn deployment_outputs(&self, deployment: &str) -> HarnessResult<HashMap<String, String>> {
        let inner = self.inner.lock().await;
        match inner.deployments.get(deployment) {
            Some(outputs) => Ok(outputs.clone()),
            None => bail!(
                ErrorKind::DeploymentNotFound,
                "deployment not found",
                format!("no deployment named `{deployment}` is registered")
            ),
        }
    }
}

impl SecretsClient for MemoryPipeline {
    async fn get_secret(&self, secret_ref: &str) -> HarnessResult<SecretString> {
        let inner = self.inner.lock().await;
        match inner.secrets.get(secret_ref) {
            Some(value) => Ok(SecretString::new(value.clone())),
            None => bail!(
                ErrorKind::SecretNotFound,
                "secret not found",
                format!("no secret stored under `{secret_ref}`")
            ),
        }
    }
}

impl ObjectStoreClient for MemoryPipeline {
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> HarnessResult<()> {
        let mut inner = self.inner.lock().await;
        inner
            .objects
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body.clone());

        // A running change-capture task picks up batches under the change-data
        // prefix as soon as they land.
        if let Some(layout) = inner.layout.clone()
            && bucket == layout.bucket_name
            && key.starts_with(&format!("{}/{}/", layout.bucket_folder, layout.change_data))
            && let Some(task) = inner.running_cdc_task()
        {
            inner.apply_change_batch(&task, &body);
        }

        Ok(())
    }
}

impl ReplicationClient for MemoryPipeline {
    async fn start_task(&self, task: &str, _mode: StartMode) -> HarnessResult<TaskStatus> {
        let mut inner = self.inner.lock().await;
        let Some(state) = inner.tasks.get(task) else {
            bail!(
                ErrorKind::ControlPlaneError,
                "replication task not found",
                format!("no task registered under `{task}`")
            );
        };

        if state.pinned {
            return Ok(state.status.clone());
        }

        match state.kind {
            TaskKind::FullLoad => {
                // Bulk loads terminate on their own once the snapshots are
                // replayed, so the emulation runs them synchronously.
                inner.run_full_load(task);
                if let Some(state) = inner.tasks.get_mut(task) {
                    state.status = TaskStatus::Stopped;
                }
            }
            TaskKind::Cdc => {
                if let Some(state) = inner.tasks.get_mut(task) {
                    state.status = TaskStatus::Running;
                }
            }
        }

        Ok(TaskStatus::Starting)
    }

    async fn stop_task(&self, task: &str) -> HarnessResult<TaskStatus> {
        let mut inner = self.inner.lock().await;
        let Some(state) = inner.tasks.get_mut(task) else {
            bail!(
                ErrorKind::ControlPlaneError,
                "replication task not found",
                format!("no task registered under `{task}`")
            );
        };

        if !state.pinned {
            state.status = TaskStatus::Stopped;
        }

        Ok(TaskStatus::Stopping)
    }

    async fn task_status(&self, task: &str) -> HarnessResult<TaskStatus> {
        let inner = self.inner.lock().await;
        match inner.tasks.get(task) {
            Some(state) => Ok(state.status.clone()),
            None => bail!(
                ErrorKind::ControlPlaneError,
                "replication task not found",
                format!("no task registered under `{task}`")
            ),
        }
    }

    async fn table_statistics(&self, task: &str) -> HarnessResult<Vec<TableStatistics>> {
        let inner = self.inner.lock().await;
        match inner.tasks.get(task) {
            Some(state) => Ok(state.statistics.clone()),
            None => bail!(
                ErrorKind::ControlPlaneError,
                "replication task not found",
                format!("no task registered under `{task}`")
            ),
        }
    }
}

impl StreamClient for MemoryPipeline {
    async fn resolve_shard(&self, stream: &str) -> HarnessResult<String> {
        let inner = self.inner.lock().await;
        match inner.stream.as_deref() {
            Some(registered) if registered == stream => Ok(SHARD_ID.to_string()),
            _ => bail!(
                ErrorKind::StreamError,
                "stream not found",
                format!("no stream registered under `{stream}`")
            ),
        }
    }

    async fn shard_iterator(
        &self,
        _stream: &str,
        _shard: &str,
        position: IteratorPosition,
    ) -> HarnessResult<String> {
        let inner = self.inner.lock().await;
        let offset = match position {
            IteratorPosition::TrimHorizon => 0,
            IteratorPosition::Latest => inner.records.len(),
        };
        Ok(offset.to_string())
    }

    async fn read_records(&self, cursor: &str, limit: usize) -> HarnessResult<RecordPage> {
        let inner = self.inner.lock().await;
        let Ok(start) = cursor.parse::<usize>() else {
            bail!(
                ErrorKind::StreamError,
                "invalid shard cursor",
                format!("cursor `{cursor}` is not a valid position")
            );
        };

        let start = start.min(inner.records.len());
        let end = (start + limit).min(inner.records.len());
        let records = inner.records[start..end].to_vec();

        // An open shard always hands back a follow-up cursor, even at the
        // tail; only a closed, fully drained shard exhausts.
        let next = if !inner.shard_open && end >= inner.records.len() {
            None
        } else {
            Some(end.to_string())
        };

        Ok(RecordPage { records, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> SourceCredentials {
        SourceCredentials {
            bucket_name: "source".to_string(),
            bucket_folder: "landing".to_string(),
            change_data: "changedata".to_string(),
        }
    }

    #[tokio::test]
    async fn full_load_replays_snapshots_with_control_records() {
        let pipeline = MemoryPipeline::new();
        pipeline.set_source_layout(layout()).await;
        pipeline.register_full_load_task("full-load").await;

        pipeline
            .put_object("source", "landing/hr/employee/LOAD001.csv", Bytes::from("1,a\n2,b"))
            .await
            .unwrap();

        pipeline
            .start_task("full-load", StartMode::Start)
            .await
            .unwrap();

        // Two control records plus one data record per row.
        let records = pipeline.records().await;
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.partition_key == "hr.employee"));

        assert_eq!(
            pipeline.task_status("full-load").await.unwrap(),
            TaskStatus::Stopped
        );

        let statistics = pipeline.table_statistics("full-load").await.unwrap();
        assert_eq!(statistics.len(), 1);
        assert_eq!(statistics[0].full_load_rows, 2);
    }

    #[tokio::test]
    async fn change_batches_are_ignored_until_the_cdc_task_runs() {
        let pipeline = MemoryPipeline::new();
        pipeline.set_source_layout(layout()).await;
        pipeline.register_cdc_task("cdc").await;

        pipeline
            .put_object(
                "source",
                "landing/changedata/cdc0000000001.csv",
                Bytes::from("INSERT,employee,hr,1,a"),
            )
            .await
            .unwrap();
        assert!(pipeline.records().await.is_empty());

        pipeline.start_task("cdc", StartMode::Start).await.unwrap();
        pipeline
            .put_object(
                "source",
                "landing/changedata/cdc0000000002.csv",
                Bytes::from("INSERT,employee,hr,1,a\nDELETE,employee,hr,1,a"),
            )
            .await
            .unwrap();

        // One control record for the single distinct table plus two data records.
        assert_eq!(pipeline.records().await.len(), 3);

        let statistics = pipeline.table_statistics("cdc").await.unwrap();
        assert_eq!(statistics[0].inserts, 1);
        assert_eq!(statistics[0].deletes, 1);
    }

    #[tokio::test]
    async fn pinned_tasks_ignore_transitions() {
        let pipeline = MemoryPipeline::new();
        pipeline.register_cdc_task("cdc").await;
        pipeline
            .pin_task_status("cdc", TaskStatus::Starting)
            .await;

        pipeline.start_task("cdc", StartMode::Start).await.unwrap();
        assert_eq!(
            pipeline.task_status("cdc").await.unwrap(),
            TaskStatus::Starting
        );
    }

    #[tokio::test]
    async fn closed_shard_exhausts_after_draining() {
        let pipeline = MemoryPipeline::new();
        pipeline.register_stream("stream").await;
        pipeline
            .append_record("k", Bytes::from("r"), Utc::now())
            .await;

        let cursor = pipeline
            .shard_iterator("stream", SHARD_ID, IteratorPosition::TrimHorizon)
            .await
            .unwrap();
        let page = pipeline.read_records(&cursor, 10).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert!(page.next.is_some());

        pipeline.close_shard().await;
        let page = pipeline
            .read_records(&page.next.unwrap(), 10)
            .await
            .unwrap();
        assert!(page.records.is_empty());
        assert!(page.next.is_none());
    }
}
