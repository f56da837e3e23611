use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The deployment name must be provided.
    #[error("`deployment` cannot be empty")]
    DeploymentEmpty,
    /// The endpoint override must be a non-empty URL when set.
    #[error("`endpoint` cannot be empty when set")]
    EndpointEmpty,
}
