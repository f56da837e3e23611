//! AWS-backed implementations of the harness client traits.
//!
//! One client bundle speaks to the whole pipeline: CloudFormation for the
//! deployment outputs, Secrets Manager for the source credentials, S3 for the
//! source store, DMS for the replication control plane, and Kinesis for the
//! downstream stream. A configured endpoint override points every client at a
//! local emulation instead of the real services.

use std::collections::HashMap;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_databasemigration::types::{Filter, StartReplicationTaskTypeValue};
use aws_sdk_kinesis::types::ShardIteratorType;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

use harness::clients::{
    ObjectStoreClient, ProvisioningClient, ReplicationClient, SecretsClient, StreamClient,
};
use harness::error::{ErrorKind, HarnessResult};
use harness::types::{
    IteratorPosition, RecordPage, StartMode, StreamRecord, TableStatistics, TaskStatus,
};
use harness::{bail, harness_error};

/// Bundle of service clients over one shared AWS configuration.
#[derive(Debug, Clone)]
pub struct AwsClients {
    cloudformation: aws_sdk_cloudformation::Client,
    dms: aws_sdk_databasemigration::Client,
    kinesis: aws_sdk_kinesis::Client,
    s3: aws_sdk_s3::Client,
    secrets: aws_sdk_secretsmanager::Client,
}

impl AwsClients {
    /// Builds all service clients for the given region.
    ///
    /// When `endpoint` is set, every client targets it instead of the real
    /// service endpoints, and S3 switches to path-style addressing since
    /// virtual-hosted buckets do not resolve against local emulations.
    pub async fn connect(region: String, endpoint: Option<String>) -> Self {
        let is_local = endpoint.is_some();

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(is_local)
            .build();

        Self {
            cloudformation: aws_sdk_cloudformation::Client::new(&config),
            dms: aws_sdk_databasemigration::Client::new(&config),
            kinesis: aws_sdk_kinesis::Client::new(&config),
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            secrets: aws_sdk_secretsmanager::Client::new(&config),
        }
    }
}

/// Converts a start mode into the control plane's wire enum.
fn start_type(mode: StartMode) -> StartReplicationTaskTypeValue {
    match mode {
        StartMode::Start => StartReplicationTaskTypeValue::StartReplication,
        StartMode::Resume => StartReplicationTaskTypeValue::ResumeProcessing,
    }
}

/// Converts a cursor position into the stream's wire enum.
fn iterator_type(position: IteratorPosition) -> ShardIteratorType {
    match position {
        IteratorPosition::TrimHorizon => ShardIteratorType::TrimHorizon,
        IteratorPosition::Latest => ShardIteratorType::Latest,
    }
}

/// Converts the stream's arrival timestamp into a chrono timestamp.
///
/// Records without a usable timestamp map to the epoch, which keeps them out
/// of every verification window rather than wrongly inside one.
fn arrival_timestamp(timestamp: Option<&aws_sdk_kinesis::primitives::DateTime>) -> DateTime<Utc> {
    timestamp
        .and_then(|ts| ts.to_millis().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

impl ProvisioningClient for AwsClients {
    async fn deployment_outputs(&self, deployment: &str) -> HarnessResult<HashMap<String, String>> {
        let response = self
            .cloudformation
            .describe_stacks()
            .stack_name(deployment)
            .send()
            .await
            .map_err(|error| {
                harness_error!(
                    ErrorKind::DeploymentNotFound,
                    "failed to describe the deployment",
                    format!("deployment `{deployment}`"),
                    source: error
                )
            })?;

        let Some(stack) = response.stacks().first() else {
            bail!(
                ErrorKind::DeploymentNotFound,
                "deployment not found",
                format!("no stack named `{deployment}`")
            );
        };

        let mut outputs = HashMap::new();
        for output in stack.outputs() {
            if let (Some(key), Some(value)) = (output.output_key(), output.output_value()) {
                outputs.insert(key.to_string(), value.to_string());
            }
        }

        Ok(outputs)
    }
}

impl SecretsClient for AwsClients {
    async fn get_secret(&self, secret_ref: &str) -> HarnessResult<SecretString> {
        let response = self
            .secrets
            .get_secret_value()
            .secret_id(secret_ref)
            .send()
            .await
            .map_err(|error| {
                harness_error!(
                    ErrorKind::SecretNotFound,
                    "failed to fetch the secret",
                    format!("secret `{secret_ref}`"),
                    source: error
                )
            })?;

        let Some(secret) = response.secret_string() else {
            bail!(
                ErrorKind::SecretInvalid,
                "secret carries no string payload",
                format!("secret `{secret_ref}`")
            );
        };

        Ok(SecretString::new(secret.to_string()))
    }
}

impl ObjectStoreClient for AwsClients {
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> HarnessResult<()> {
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|error| {
                harness_error!(
                    ErrorKind::ObjectStoreError,
                    "failed to write object",
                    format!("bucket `{bucket}`, key `{key}`"),
                    source: error
                )
            })?;

        Ok(())
    }
}

impl ReplicationClient for AwsClients {
    async fn start_task(&self, task: &str, mode: StartMode) -> HarnessResult<TaskStatus> {
        let response = self
            .dms
            .start_replication_task()
            .replication_task_arn(task)
            .start_replication_task_type(start_type(mode))
            .send()
            .await
            .map_err(|error| {
                harness_error!(
                    ErrorKind::ControlPlaneError,
                    "failed to start replication task",
                    format!("task `{task}`"),
                    source: error
                )
            })?;

        Ok(reported_status(
            response.replication_task().and_then(|t| t.status()),
        ))
    }

    async fn stop_task(&self, task: &str) -> HarnessResult<TaskStatus> {
        let response = self
            .dms
            .stop_replication_task()
            .replication_task_arn(task)
            .send()
            .await
            .map_err(|error| {
                harness_error!(
                    ErrorKind::ControlPlaneError,
                    "failed to stop replication task",
                    format!("task `{task}`"),
                    source: error
                )
            })?;

        Ok(reported_status(
            response.replication_task().and_then(|t| t.status()),
        ))
    }

    async fn task_status(&self, task: &str) -> HarnessResult<TaskStatus> {
        let filter = Filter::builder()
            .name("replication-task-arn")
            .values(task)
            .build()
            .map_err(|error| {
                harness_error!(
                    ErrorKind::ControlPlaneError,
                    "invalid task filter",
                    source: error
                )
            })?;

        let response = self
            .dms
            .describe_replication_tasks()
            .filters(filter)
            .without_settings(true)
            .send()
            .await
            .map_err(|error| {
                harness_error!(
                    ErrorKind::ControlPlaneError,
                    "failed to describe replication task",
                    format!("task `{task}`"),
                    source: error
                )
            })?;

        let Some(status) = response
            .replication_tasks()
            .first()
            .and_then(|t| t.status())
        else {
            bail!(
                ErrorKind::ControlPlaneError,
                "replication task reported no status",
                format!("task `{task}`")
            );
        };

        Ok(TaskStatus::from(status))
    }

    async fn table_statistics(&self, task: &str) -> HarnessResult<Vec<TableStatistics>> {
        let response = self
            .dms
            .describe_table_statistics()
            .replication_task_arn(task)
            .send()
            .await
            .map_err(|error| {
                harness_error!(
                    ErrorKind::ControlPlaneError,
                    "failed to fetch table statistics",
                    format!("task `{task}`"),
                    source: error
                )
            })?;

        let rows = response
            .table_statistics()
            .iter()
            .map(|row| TableStatistics {
                schema_name: row.schema_name().unwrap_or_default().to_string(),
                table_name: row.table_name().unwrap_or_default().to_string(),
                full_load_rows: counter(Some(row.full_load_rows())),
                inserts: counter(Some(row.inserts())),
                updates: counter(Some(row.updates())),
                deletes: counter(Some(row.deletes())),
            })
            .collect();

        Ok(rows)
    }
}

impl StreamClient for AwsClients {
    async fn resolve_shard(&self, stream: &str) -> HarnessResult<String> {
        let response = self
            .kinesis
            .describe_stream()
            .stream_arn(stream)
            .send()
            .await
            .map_err(|error| {
                harness_error!(
                    ErrorKind::StreamError,
                    "failed to describe stream",
                    format!("stream `{stream}`"),
                    source: error
                )
            })?;

        let Some(shard) = response
            .stream_description()
            .map(|description| description.shards())
            .and_then(|shards| shards.first())
        else {
            bail!(
                ErrorKind::StreamError,
                "stream has no shards",
                format!("stream `{stream}`")
            );
        };

        Ok(shard.shard_id().to_string())
    }

    async fn shard_iterator(
        &self,
        stream: &str,
        shard: &str,
        position: IteratorPosition,
    ) -> HarnessResult<String> {
        let response = self
            .kinesis
            .get_shard_iterator()
            .stream_arn(stream)
            .shard_id(shard)
            .shard_iterator_type(iterator_type(position))
            .send()
            .await
            .map_err(|error| {
                harness_error!(
                    ErrorKind::StreamError,
                    "failed to obtain shard iterator",
                    format!("stream `{stream}`, shard `{shard}`"),
                    source: error
                )
            })?;

        match response.shard_iterator() {
            Some(cursor) => Ok(cursor.to_string()),
            None => bail!(
                ErrorKind::StreamError,
                "stream returned no shard iterator",
                format!("stream `{stream}`, shard `{shard}`")
            ),
        }
    }

    async fn read_records(&self, cursor: &str, limit: usize) -> HarnessResult<RecordPage> {
        let response = self
            .kinesis
            .get_records()
            .shard_iterator(cursor)
            .limit(limit as i32)
            .send()
            .await
            .map_err(|error| {
                harness_error!(
                    ErrorKind::StreamError,
                    "failed to read stream records",
                    source: error
                )
            })?;

        let records = response
            .records()
            .iter()
            .map(|record| StreamRecord {
                data: Bytes::copy_from_slice(record.data().as_ref()),
                partition_key: record.partition_key().to_string(),
                arrival: arrival_timestamp(record.approximate_arrival_timestamp()),
            })
            .collect();

        Ok(RecordPage {
            records,
            next: response.next_shard_iterator().map(str::to_string),
        })
    }
}

/// Maps the optional status of a start/stop response to a [`TaskStatus`].
fn reported_status(status: Option<&str>) -> TaskStatus {
    status
        .map(TaskStatus::from)
        .unwrap_or_else(|| TaskStatus::Other("unknown".to_string()))
}

/// Clamps an optional signed counter to an unsigned value.
fn counter(value: Option<i64>) -> u64 {
    value.unwrap_or_default().max(0) as u64
}
