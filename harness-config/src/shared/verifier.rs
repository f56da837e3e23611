use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Default region used when the configuration does not specify one.
const DEFAULT_REGION: &str = "us-east-1";

/// Configuration for a verifier run against a provisioned pipeline.
///
/// The verifier resolves everything else it needs (task identifiers, stream
/// identifier, source credentials) at runtime from the deployment's outputs;
/// this struct only carries the coordinates of that resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VerifierConfig {
    /// Name of the deployment whose outputs describe the pipeline under test.
    pub deployment: String,
    /// Optional local endpoint override for all service clients.
    ///
    /// When set, the verifier targets a local emulation of the cloud services
    /// and switches to the short-patience retry mode.
    pub endpoint: Option<String>,
    /// Region the pipeline is deployed in.
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl VerifierConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.deployment.trim().is_empty() {
            return Err(ValidationError::DeploymentEmpty);
        }

        if let Some(endpoint) = &self.endpoint
            && endpoint.trim().is_empty()
        {
            return Err(ValidationError::EndpointEmpty);
        }

        Ok(())
    }

    /// Returns whether the verifier targets a local emulation endpoint.
    pub fn is_local(&self) -> bool {
        self.endpoint.is_some()
    }
}
