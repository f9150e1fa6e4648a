//! Retry-with-backoff resilience policy.
//!
//! The schedule is an explicit attempt counter with linear backoff
//! (`attempt * base_delay`) and an injected [`Sleeper`], so the policy is a
//! pure, testable decision decoupled from actual I/O. The delay suspends
//! only the current call chain; concurrent unrelated operations are
//! unaffected. No jitter, no circuit breaker, no overall deadline — callers
//! that need a wall-clock bound must impose it externally.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

// ---------------------------------------------------------------------------
// Sleeper
// ---------------------------------------------------------------------------

/// Delay source injected into the retry policy.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately and records every requested delay.
/// Lets tests assert the backoff schedule without waiting it out.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: parking_lot::Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}

impl RecordingSleeper {
    /// The delays requested so far, in order.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempt ceiling, including the first invocation.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n * base_delay` before attempt `n + 1`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Runs `op` up to `max_attempts` times, retrying every failure.
    ///
    /// Success at any attempt returns immediately; the final attempt's
    /// failure is propagated unchanged — classification is a separate
    /// concern.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error once the ceiling is reached.
    pub async fn execute<T, E, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        op: impl FnMut() -> Fut,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_if(sleeper, op, |_| true).await
    }

    /// Like [`execute`](Self::execute), but consults `retryable` before each
    /// re-attempt. A terminal failure (e.g. a not-found answer) is
    /// propagated without burning the remaining attempts.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last attempt's error
    /// once the ceiling is reached.
    pub async fn execute_if<T, E, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: impl FnMut() -> Fut,
        retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts || !retryable(&err) {
                        return Err(err);
                    }
                    warn!(attempt, error = %err, "attempt failed, backing off");
                    sleeper.sleep(self.base_delay * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Operation that fails the first `failures` invocations, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        async fn invoke(&self) -> Result<&'static str, String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(format!("failure {call}"))
            } else {
                Ok("done")
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn succeeds_first_try_without_sleeping() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::default();
        let flaky = Flaky::new(0);

        let result = policy.execute(&sleeper, || flaky.invoke()).await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(flaky.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn fail_once_then_succeed_uses_exactly_two_attempts() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::default();
        let flaky = Flaky::new(1);

        let result = policy.execute(&sleeper, || flaky.invoke()).await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(flaky.calls(), 2);
        // One backoff of 1 * base_delay between the two attempts.
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn always_failing_propagates_final_error_unchanged() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::default();
        let flaky = Flaky::new(u32::MAX);

        let err = policy.execute(&sleeper, || flaky.invoke()).await.unwrap_err();
        assert_eq!(err, "failure 2");
        assert_eq!(flaky.calls(), 2);
    }

    #[tokio::test]
    async fn backoff_grows_linearly_with_attempt_number() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        };
        let sleeper = RecordingSleeper::default();
        let flaky = Flaky::new(3);

        let result = policy.execute(&sleeper, || flaky.invoke()).await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(flaky.calls(), 4);
        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(300),
            ]
        );
    }

    #[tokio::test]
    async fn terminal_error_short_circuits_remaining_attempts() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
        };
        let sleeper = RecordingSleeper::default();
        let flaky = Flaky::new(u32::MAX);

        let err = policy
            .execute_if(&sleeper, || flaky.invoke(), |_| false)
            .await
            .unwrap_err();
        assert_eq!(err, "failure 1");
        assert_eq!(flaky.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn single_attempt_policy_never_retries() {
        let policy = RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_secs(1),
        };
        let sleeper = RecordingSleeper::default();
        let flaky = Flaky::new(u32::MAX);

        let err = policy.execute(&sleeper, || flaky.invoke()).await.unwrap_err();
        assert_eq!(err, "failure 1");
        assert_eq!(flaky.calls(), 1);
    }

    proptest::proptest! {
        /// Invocations never exceed the ceiling; success happens exactly
        /// when the failure streak is shorter than the ceiling, with one
        /// backoff per spent retry.
        #[test]
        fn attempt_count_is_bounded_by_the_ceiling(
            max_attempts in 1u32..6,
            failures in 0u32..10,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let policy = RetryPolicy {
                    max_attempts,
                    base_delay: Duration::from_millis(1),
                };
                let sleeper = RecordingSleeper::default();
                let flaky = Flaky::new(failures);

                let result = policy.execute(&sleeper, || flaky.invoke()).await;

                let expected_calls = failures.saturating_add(1).min(max_attempts);
                assert_eq!(flaky.calls(), expected_calls);
                assert_eq!(result.is_ok(), failures < max_attempts);
                assert_eq!(sleeper.delays().len() as u32, expected_calls - 1);
            });
        }
    }
}
