//! Retry with exponential backoff for remote calls.
//!
//! Only failures whose [`ErrorKind`](crate::remote::ErrorKind) is transient are
//! retried; everything else is returned on the first attempt.

use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::remote::{RemoteError, RemoteResult};

/// Default number of attempts per remote call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// How many times to try a remote call and how long to wait between tries.
///
/// Stateless, so one policy can be shared by every call an executor makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay after the failure of zero-based attempt `attempt`: `base * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(31)))
    }

    /// Runs `operation` until it succeeds, fails fatally, or attempts run out.
    ///
    /// The error of the last attempt is returned unchanged.
    pub async fn execute<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> RemoteResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let mut attempt = 0;
        loop {
            let err: RemoteError = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_transient() {
                return Err(err);
            }

            if attempt + 1 >= self.max_attempts {
                error!(
                    "'{}' failed after {} attempts ({}): {}",
                    operation_name, self.max_attempts, err.kind, err
                );
                return Err(err);
            }

            let delay = self.delay_for_attempt(attempt);
            warn!(
                "'{}' failed ({}). Retrying in {:?} (attempt {}/{}): {}",
                operation_name,
                err.kind,
                delay,
                attempt + 1,
                self.max_attempts,
                err
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
