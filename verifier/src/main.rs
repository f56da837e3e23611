//! Pipeline verifier binary.
//!
//! Drives a provisioned data-replication deployment end to end: injects known
//! fixtures into the source store, runs the bulk-load and change-capture
//! tasks, and verifies that the downstream stream observes the expected
//! events.

use std::process::ExitCode;

use harness_config::shared::VerifierConfig;
use harness_telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_verifier_config;
use crate::core::start_verifier_with_config;
use crate::error::{VerifierError, VerifierResult};

mod aws;
mod config;
mod core;
mod error;

/// Entry point for the verifier.
///
/// Loads configuration, initializes tracing, starts the async runtime, and
/// runs the verification scenarios. All failures are rendered to stderr and
/// mapped to a failing exit code.
fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run() -> VerifierResult<()> {
    let verifier_config = load_verifier_config()?;

    init_tracing(env!("CARGO_BIN_NAME")).map_err(VerifierError::config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(verifier_config))
}

async fn async_main(verifier_config: VerifierConfig) -> VerifierResult<()> {
    if let Err(err) = start_verifier_with_config(verifier_config).await {
        error!("{err}");

        return Err(err);
    }

    Ok(())
}
