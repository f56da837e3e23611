//! Bounded retry executor for fallible asynchronous operations.
//!
//! This is the only general-purpose concurrency-masking primitive in the
//! harness: every wait-for-eventual-condition is expressed as "assert the
//! condition; if unmet, the assertion failure is the retryable failure". The
//! interval is fixed, not exponential, because the waits here synchronize with
//! external state machines that advance on their own schedule.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::HarnessResult;

/// Attempt budget and pause interval for [`retry`].
///
/// The policy is selected once, process-wide, based on whether a local endpoint
/// override is configured: real cloud-backed systems get the long patience of
/// [`RetryPolicy::cloud`], local emulations the short patience of
/// [`RetryPolicy::local`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    /// Creates a policy with an explicit attempt budget and interval.
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Long-patience policy for real asynchronous cloud-backed systems.
    ///
    /// 100 retries at 5s apart bound the wait at roughly eight minutes.
    pub const fn cloud() -> Self {
        Self::new(100, Duration::from_secs(5))
    }

    /// Short-patience policy for local emulated environments.
    pub const fn local() -> Self {
        Self::new(10, Duration::from_secs(1))
    }
}

/// Invokes `operation` until it succeeds or the attempt budget is exhausted.
///
/// The operation is invoked up to `max_attempts + 1` times, sleeping the policy
/// interval between attempts. On exhaustion the **last** observed error is
/// returned, so callers can distinguish "gave up after N tries" from an
/// immediate failure: whatever diagnostic the final attempt produced survives.
pub async fn retry<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> HarnessResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HarnessResult<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= policy.max_attempts {
                    return Err(error);
                }

                debug!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %error,
                    "attempt failed, retrying after interval"
                );

                attempt += 1;
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}
