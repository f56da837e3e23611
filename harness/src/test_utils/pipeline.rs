use std::collections::HashMap;
use std::time::Duration;

use crate::clients::memory::MemoryPipeline;
use crate::resolve::{
    OUTPUT_CDC_TASK, OUTPUT_FULL_LOAD_TASK, OUTPUT_SOURCE_SECRET, OUTPUT_STREAM,
    resolve_coordinates, resolve_credentials,
};
use crate::retry::RetryPolicy;
use crate::scenario::Harness;
use crate::types::SourceCredentials;

/// Deployment name used by the provisioned test pipeline.
pub const TEST_DEPLOYMENT: &str = "verification-pipeline";

/// Identifier of the test bulk load task.
pub const TEST_FULL_LOAD_TASK: &str = "task-full-load";

/// Identifier of the test change-capture task.
pub const TEST_CDC_TASK: &str = "task-cdc";

/// Identifier of the test stream.
pub const TEST_STREAM: &str = "stream-verification";

/// Reference of the test source credentials secret.
pub const TEST_SOURCE_SECRET: &str = "secret-source-store";

/// Retry policy with intervals short enough for tests.
pub fn test_policy() -> RetryPolicy {
    RetryPolicy::new(10, Duration::from_millis(10))
}

/// Source layout the test pipeline watches.
pub fn test_credentials() -> SourceCredentials {
    SourceCredentials {
        bucket_name: "source-bucket".to_string(),
        bucket_folder: "landing".to_string(),
        change_data: "changedata".to_string(),
    }
}

/// Builds a fully provisioned in-memory pipeline: deployment outputs, source
/// credentials secret, both replication tasks, and the stream.
pub async fn provisioned_pipeline() -> MemoryPipeline {
    let pipeline = MemoryPipeline::new();

    let credentials = test_credentials();
    pipeline
        .register_deployment(
            TEST_DEPLOYMENT,
            HashMap::from([
                (
                    OUTPUT_FULL_LOAD_TASK.to_string(),
                    TEST_FULL_LOAD_TASK.to_string(),
                ),
                (OUTPUT_CDC_TASK.to_string(), TEST_CDC_TASK.to_string()),
                (OUTPUT_STREAM.to_string(), TEST_STREAM.to_string()),
                (
                    OUTPUT_SOURCE_SECRET.to_string(),
                    TEST_SOURCE_SECRET.to_string(),
                ),
                ("sourceBucket".to_string(), credentials.bucket_name.clone()),
            ]),
        )
        .await;

    let secret = serde_json::to_string(&credentials).expect("credentials serialize to JSON");
    pipeline.register_secret(TEST_SOURCE_SECRET, &secret).await;
    pipeline.set_source_layout(credentials).await;

    pipeline.register_full_load_task(TEST_FULL_LOAD_TASK).await;
    pipeline.register_cdc_task(TEST_CDC_TASK).await;
    pipeline.register_stream(TEST_STREAM).await;

    pipeline
}

/// Resolves coordinates and credentials from the pipeline's own provisioning
/// surface and builds a harness over it, the way the verifier binary does.
pub async fn test_harness(
    pipeline: &MemoryPipeline,
) -> Harness<MemoryPipeline, MemoryPipeline, MemoryPipeline> {
    let coordinates = resolve_coordinates(pipeline, TEST_DEPLOYMENT)
        .await
        .expect("test deployment resolves");
    let credentials = resolve_credentials(pipeline, &coordinates.source_secret)
        .await
        .expect("test credentials resolve");

    Harness::new(
        pipeline.clone(),
        pipeline.clone(),
        pipeline.clone(),
        coordinates,
        credentials,
        test_policy(),
    )
}
