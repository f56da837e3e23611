//! Error types and result definitions for the verification harness.
//!
//! Provides a single error type with classification, an optional dynamic detail
//! string, an optional source error, and the captured callsite location. The
//! detail field is where waiters record the last observed value before giving
//! up, so that exhausted retries stay diagnosable.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for harness operations using [`HarnessError`] as the error type.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Specific categories of errors that can occur while driving the pipeline.
///
/// The taxonomy follows the harness failure model: not-found errors are fatal
/// and never retried, mismatch errors are retryable inside waiters and fatal
/// once retries exhaust, and the remaining kinds classify collaborator
/// failures by the surface they came from.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Resolution errors, fatal with no retry.
    DeploymentNotFound,
    SecretNotFound,
    SecretInvalid,

    // Collaborator errors, retryable when they occur inside a retry window.
    ControlPlaneError,
    ObjectStoreError,
    StreamError,

    // Assertion errors, retryable inside waiters.
    StatusMismatch,
}

/// Detailed payload stored in a [`HarnessError`].
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Main error type for harness operations.
#[derive(Debug, Clone)]
pub struct HarnessError {
    payload: ErrorPayload,
}

impl HarnessError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.payload.kind
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.payload.detail.as_deref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.payload.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// The stored source is preserved across clones and exposed via [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.payload.source = Some(Arc::new(source));
        self
    }

    /// Creates a [`HarnessError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
    ) -> Self {
        HarnessError {
            payload: ErrorPayload {
                kind,
                description,
                detail,
                source: None,
                location: Location::caller(),
            },
        }
    }
}

impl PartialEq for HarnessError {
    fn eq(&self, other: &HarnessError) -> bool {
        self.payload.kind == other.payload.kind
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let location = self.payload.location;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.payload.kind,
            self.payload.description,
            location.file(),
            location.line(),
            location.column()
        )?;

        if let Some(detail) = self.payload.detail.as_deref() {
            write!(f, "\n  detail: {detail}")?;
        }

        Ok(())
    }
}

impl error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.payload
            .source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

impl From<(ErrorKind, &'static str)> for HarnessError {
    #[track_caller]
    fn from((kind, description): (ErrorKind, &'static str)) -> Self {
        HarnessError::from_components(kind, Cow::Borrowed(description), None)
    }
}

impl From<(ErrorKind, String)> for HarnessError {
    #[track_caller]
    fn from((kind, description): (ErrorKind, String)) -> Self {
        HarnessError::from_components(kind, Cow::Owned(description), None)
    }
}

impl From<(ErrorKind, &'static str, String)> for HarnessError {
    #[track_caller]
    fn from((kind, description, detail): (ErrorKind, &'static str, String)) -> Self {
        HarnessError::from_components(kind, Cow::Borrowed(description), Some(Cow::Owned(detail)))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn error_exposes_kind_and_detail() {
        let error = HarnessError::from((
            ErrorKind::StatusMismatch,
            "task status did not match",
            "last observed `starting`".to_string(),
        ));

        assert_eq!(error.kind(), ErrorKind::StatusMismatch);
        assert_eq!(error.detail(), Some("last observed `starting`"));
    }

    #[test]
    fn error_equality_compares_kinds_only() {
        let a = HarnessError::from((ErrorKind::StreamError, "fetch failed"));
        let b = HarnessError::from((
            ErrorKind::StreamError,
            "different description",
            "detail".to_string(),
        ));

        assert_eq!(a, b);
    }

    #[test]
    fn error_preserves_source() {
        let io = std::io::Error::other("boom");
        let error = HarnessError::from((ErrorKind::ObjectStoreError, "put failed")).with_source(io);

        assert!(error.source().is_some());
    }

    #[test]
    fn display_includes_location_and_detail() {
        let error = HarnessError::from((
            ErrorKind::DeploymentNotFound,
            "deployment not found",
            "deployment `pipeline`".to_string(),
        ));
        let rendered = error.to_string();

        assert!(rendered.contains("DeploymentNotFound"));
        assert!(rendered.contains("error.rs"));
        assert!(rendered.contains("deployment `pipeline`"));
    }
}
