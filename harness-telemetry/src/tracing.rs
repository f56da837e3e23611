use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive applied when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

/// Errors that can occur while initializing tracing.
#[derive(Debug, Error)]
pub enum InitTracingError {
    /// The `log` crate bridge could not be installed.
    #[error("failed to install the log tracer: {0}")]
    LogTracer(#[from] tracing_log::log_tracer::SetLoggerError),

    /// A global subscriber was already installed.
    #[error("failed to install the tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Initializes the global tracing subscriber for a binary.
///
/// Installs a formatting layer with an environment-driven filter (defaulting to
/// `info`) and bridges the `log` crate into `tracing`. Must be called once,
/// before any spans or events are emitted.
pub fn init_tracing(service_name: &str) -> Result<(), InitTracingError> {
    LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;

    tracing::info!(service = service_name, "tracing initialized");

    Ok(())
}
