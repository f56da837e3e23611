use harness_config::shared::VerifierConfig;
use harness::resolve::{resolve_coordinates, resolve_credentials};
use harness::retry::RetryPolicy;
use harness::scenario::Harness;
use tracing::info;

use crate::aws::AwsClients;
use crate::error::VerifierResult;

/// Runs both verification scenarios against the configured deployment.
///
/// Resolves the pipeline coordinates and the source credentials first, then
/// drives the bulk-load and change-capture scenarios to completion. Any
/// failure aborts the run; there is no partial-result reporting beyond what
/// the scenarios log themselves.
pub async fn start_verifier_with_config(config: VerifierConfig) -> VerifierResult<()> {
    let policy = if config.is_local() {
        RetryPolicy::local()
    } else {
        RetryPolicy::cloud()
    };

    info!(
        deployment = %config.deployment,
        region = %config.region,
        local = config.is_local(),
        "connecting to pipeline services"
    );

    let clients = AwsClients::connect(config.region.clone(), config.endpoint.clone()).await;

    let coordinates = resolve_coordinates(&clients, &config.deployment).await?;
    let credentials = resolve_credentials(&clients, &coordinates.source_secret).await?;

    let harness = Harness::new(
        clients.clone(),
        clients.clone(),
        clients,
        coordinates,
        credentials,
        policy,
    );

    harness.run().await?;

    info!("pipeline verification succeeded");

    Ok(())
}
