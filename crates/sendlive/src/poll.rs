//! Bounded polling of long-running vendor operations.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::error::{Error, Result};

/// Tracing target for operation polling.
pub const TRACING_TARGET: &str = "sendlive::poll";

/// Default delay between two polls of the same operation.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How long to wait for an operation and how often to check on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Overall deadline for the operation.
    pub timeout: Duration,
    /// Delay between checks.
    pub interval: Duration,
}

impl PollPolicy {
    /// Creates a policy with the given deadline and the default interval.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the delay between checks.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Repeatedly runs `check` until it yields a terminal value.
///
/// `check` returns `Ok(None)` while the operation is still running. The
/// first check runs immediately; a zero interval falls back to
/// [`DEFAULT_POLL_INTERVAL`]. An error from `check` ends polling at once;
/// running out of time yields [`ErrorKind::OperationTimeout`] carrying
/// `operation`, and the remote operation may still complete afterwards.
///
/// [`ErrorKind::OperationTimeout`]: crate::ErrorKind::OperationTimeout
pub async fn poll_until<T, F, Fut>(operation: &str, policy: PollPolicy, mut check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    tracing::debug!(
        target: TRACING_TARGET,
        operation,
        timeout_secs = policy.timeout.as_secs(),
        "Waiting for operation"
    );

    let wait = async {
        let interval = if policy.interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            policy.interval
        };
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempts = 0u32;
        loop {
            ticker.tick().await;
            attempts += 1;

            if let Some(value) = check().await? {
                tracing::debug!(target: TRACING_TARGET, operation, attempts, "Operation done");
                return Ok::<_, Error>(value);
            }

            tracing::trace!(target: TRACING_TARGET, operation, attempts, "Operation pending");
        }
    };

    match time::timeout(policy.timeout, wait).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                target: TRACING_TARGET,
                operation,
                timeout_secs = policy.timeout.as_secs(),
                "Gave up waiting for operation"
            );
            Err(Error::operation_timeout(operation))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::ErrorKind;

    fn policy() -> PollPolicy {
        PollPolicy::new(Duration::from_secs(60)).with_interval(Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_once_done() {
        let calls = Arc::new(AtomicU32::new(0));

        let value = poll_until("op-1", policy(), || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok((n == 3).then_some("done"))
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_with_operation_name() {
        let error = poll_until("op-slow", policy(), || async { Ok(None::<()>) })
            .await
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::OperationTimeout);
        assert_eq!(error.operation.as_deref(), Some("op-slow"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_error_stops_polling() {
        let calls = Arc::new(AtomicU32::new(0));

        let error = poll_until("op-bad", policy(), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<Option<()>, _>(Error::provider("operation failed"))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(error.kind, ErrorKind::Provider);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
