//! Resolution of pipeline coordinates and source credentials.
//!
//! Both resolutions happen once per process run: read at start, never mutated,
//! no teardown. Absence of the deployment or of a required output is fatal and
//! never retried.

use std::collections::HashMap;

use secrecy::ExposeSecret;
use tracing::info;

use crate::clients::{ProvisioningClient, SecretsClient};
use crate::error::{ErrorKind, HarnessResult};
use crate::harness_error;
use crate::types::{PipelineCoordinates, SourceCredentials};

/// Output key naming the bulk load task.
pub const OUTPUT_FULL_LOAD_TASK: &str = "fullLoadTask";

/// Output key naming the change-capture task.
pub const OUTPUT_CDC_TASK: &str = "cdcTask";

/// Output key naming the downstream stream.
pub const OUTPUT_STREAM: &str = "kinesisStream";

/// Output key naming the source credentials secret.
pub const OUTPUT_SOURCE_SECRET: &str = "s3Secret";

/// Resolves the pipeline coordinates from a deployment's output set.
pub async fn resolve_coordinates<P>(
    client: &P,
    deployment: &str,
) -> HarnessResult<PipelineCoordinates>
where
    P: ProvisioningClient,
{
    let outputs = client.deployment_outputs(deployment).await?;

    let coordinates = PipelineCoordinates {
        full_load_task: required_output(&outputs, deployment, OUTPUT_FULL_LOAD_TASK)?,
        cdc_task: required_output(&outputs, deployment, OUTPUT_CDC_TASK)?,
        stream: required_output(&outputs, deployment, OUTPUT_STREAM)?,
        source_secret: required_output(&outputs, deployment, OUTPUT_SOURCE_SECRET)?,
    };

    info!(
        deployment = %deployment,
        full_load_task = %coordinates.full_load_task,
        cdc_task = %coordinates.cdc_task,
        stream = %coordinates.stream,
        "resolved pipeline coordinates"
    );

    Ok(coordinates)
}

fn required_output(
    outputs: &HashMap<String, String>,
    deployment: &str,
    key: &str,
) -> HarnessResult<String> {
    outputs.get(key).cloned().ok_or_else(|| {
        harness_error!(
            ErrorKind::DeploymentNotFound,
            "deployment output missing",
            format!("deployment `{deployment}` has no `{key}` output")
        )
    })
}

/// Resolves the source credentials from the secret store.
pub async fn resolve_credentials<S>(
    client: &S,
    secret_ref: &str,
) -> HarnessResult<SourceCredentials>
where
    S: SecretsClient,
{
    let secret = client.get_secret(secret_ref).await?;

    let credentials: SourceCredentials = serde_json::from_str(secret.expose_secret())
        .map_err(|error| {
            harness_error!(
                ErrorKind::SecretInvalid,
                "source credentials secret is not valid JSON",
                format!("secret `{secret_ref}` could not be deserialized"),
                source: error
            )
        })?;

    info!(
        bucket = %credentials.bucket_name,
        folder = %credentials.bucket_folder,
        "resolved source credentials"
    );

    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::memory::MemoryPipeline;

    #[tokio::test]
    async fn missing_deployment_is_fatal() {
        let pipeline = MemoryPipeline::new();

        let error = resolve_coordinates(&pipeline, "missing").await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::DeploymentNotFound);
    }

    #[tokio::test]
    async fn missing_output_names_the_key() {
        let pipeline = MemoryPipeline::new();
        pipeline
            .register_deployment(
                "pipeline",
                HashMap::from([(OUTPUT_FULL_LOAD_TASK.to_string(), "task".to_string())]),
            )
            .await;

        let error = resolve_coordinates(&pipeline, "pipeline").await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::DeploymentNotFound);
        assert!(error.detail().unwrap().contains(OUTPUT_CDC_TASK));
    }

    #[tokio::test]
    async fn complete_outputs_resolve() {
        let pipeline = MemoryPipeline::new();
        pipeline
            .register_deployment(
                "pipeline",
                HashMap::from([
                    (OUTPUT_FULL_LOAD_TASK.to_string(), "task-full".to_string()),
                    (OUTPUT_CDC_TASK.to_string(), "task-cdc".to_string()),
                    (OUTPUT_STREAM.to_string(), "stream".to_string()),
                    (OUTPUT_SOURCE_SECRET.to_string(), "secret".to_string()),
                ]),
            )
            .await;

        let coordinates = resolve_coordinates(&pipeline, "pipeline").await.unwrap();

        assert_eq!(coordinates.full_load_task, "task-full");
        assert_eq!(coordinates.cdc_task, "task-cdc");
        assert_eq!(coordinates.stream, "stream");
        assert_eq!(coordinates.source_secret, "secret");
    }

    #[tokio::test]
    async fn malformed_secret_is_invalid() {
        let pipeline = MemoryPipeline::new();
        pipeline.register_secret("secret", "not json").await;

        let error = resolve_credentials(&pipeline, "secret").await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::SecretInvalid);
    }

    #[tokio::test]
    async fn well_formed_secret_resolves() {
        let pipeline = MemoryPipeline::new();
        pipeline
            .register_secret(
                "secret",
                r#"{"bucket_name":"source","bucket_folder":"landing","change_data":"changedata"}"#,
            )
            .await;

        let credentials = resolve_credentials(&pipeline, "secret").await.unwrap();

        assert_eq!(credentials.bucket_name, "source");
        assert_eq!(credentials.bucket_folder, "landing");
        assert_eq!(credentials.change_data, "changedata");
    }
}
