use harness_config::load_config;
use harness_config::shared::VerifierConfig;

use crate::error::{VerifierError, VerifierResult};

/// Loads and validates the verifier configuration.
///
/// Uses the standard configuration loading mechanism from [`harness_config`] and
/// validates the resulting [`VerifierConfig`] before returning it.
pub fn load_verifier_config() -> VerifierResult<VerifierConfig> {
    let config = load_config::<VerifierConfig>().map_err(VerifierError::config)?;
    config.validate().map_err(VerifierError::config)?;

    Ok(config)
}
