use std::error::Error;

use harness::error::HarnessError;
use thiserror::Error;

/// Result type for verifier operations.
pub type VerifierResult<T> = Result<T, VerifierError>;

/// Error type for the verifier binary.
///
/// Wraps [`HarnessError`] for pipeline verification failures and provides
/// variants for infrastructure errors.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// Pipeline verification error.
    #[error(transparent)]
    Harness(#[from] HarnessError),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[source] Box<dyn Error + Send + Sync>),
    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifierError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            VerifierError::Harness(_) => "verification error",
            VerifierError::Config(_) => "configuration error",
            VerifierError::Io(_) => "i/o error",
        }
    }

    /// Creates a configuration error from any boxed source.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        VerifierError::Config(Box::new(err))
    }

    /// Returns a user-oriented report for terminal output.
    ///
    /// Includes the category, the error itself, and the chain of causes so
    /// that the last observed state recorded in error details survives to the
    /// terminal.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("verifier failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        let mut source = Error::source(self);
        let mut idx = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {idx}: {err}\n"));
            source = err.source();
            idx += 1;
        }

        out
    }
}
