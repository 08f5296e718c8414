// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bounded retry for backend connectivity.
//!
//! Only bootstrap retries: translation never does, and request-path backend
//! calls fail straight through to the caller.
//!
//! # Example
//!
//! ```
//! use search_gateway::RetryConfig;
//! use std::time::Duration;
//!
//! // Wait for the backend: 10 attempts, 3 seconds apart
//! let bootstrap = RetryConfig::fixed(10, Duration::from_secs(3));
//! assert_eq!(bootstrap.max_attempts, 10);
//! assert_eq!(bootstrap.delay, Duration::from_secs(3));
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

/// Retry budget and pacing.
///
/// `max_attempts` counts every call including the first; there is no
/// unbounded mode.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub delay: Duration,
    pub max_attempts: usize,
}

impl RetryConfig {
    /// Fixed budget, fixed delay between attempts.
    #[must_use]
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Fast retry for tests (minimal delays)
    #[cfg(test)]
    pub fn test() -> Self {
        Self::fixed(3, Duration::from_millis(1))
    }
}

/// Run `operation` until it succeeds or the budget is spent.
///
/// Returns the last error on exhaustion.
pub async fn retry<F, Fut, T, E>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(val) => {
                if attempts > 0 {
                    info!(operation = operation_name, retries = attempts, "Operation succeeded after retries");
                }
                return Ok(val);
            }
            Err(err) => {
                attempts += 1;

                if attempts >= config.max_attempts {
                    warn!(
                        operation = operation_name,
                        attempts,
                        error = %err,
                        "Retry budget exhausted"
                    );
                    return Err(err);
                }

                warn!(
                    "Operation '{}' failed (attempt {}/{}): {}. Retrying in {:?}...",
                    operation_name, attempts, config.max_attempts, err, config.delay
                );

                crate::metrics::record_retry(operation_name);
                sleep(config.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError(String);

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_try() {
        let result: Result<i32, TestError> =
            retry("test_op", &RetryConfig::test(), || async { Ok(42) }).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();

        let result: Result<i32, TestError> = retry("test_op", &RetryConfig::test(), || {
            let a = attempts_clone.clone();
            async move {
                let count = a.fetch_add(1, Ordering::SeqCst) + 1;
                if count < 3 {
                    Err(TestError(format!("fail {}", count)))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausts_budget() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();

        let result: Result<i32, TestError> = retry("test_op", &RetryConfig::test(), || {
            let a = attempts_clone.clone();
            async move {
                a.fetch_add(1, Ordering::SeqCst);
                Err(TestError("always fail".to_string()))
            }
        })
        .await;

        assert!(result.unwrap_err().0.contains("always fail"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        assert_eq!(RetryConfig::fixed(0, Duration::ZERO).max_attempts, 1);
    }

    fn retries_recorded(succeed_on: usize) -> u64 {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            let attempts = AtomicUsize::new(0);
            let attempt = || {
                let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if count >= succeed_on {
                        Ok(())
                    } else {
                        Err(TestError("refused".into()))
                    }
                }
            };
            let _: Result<(), TestError> =
                runtime.block_on(retry("core_status", &RetryConfig::test(), attempt));
        });

        snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, ..)| key.key().name() == "search_gateway_retries_total")
            .map(|(.., value)| match value {
                DebugValue::Counter(n) => n,
                other => panic!("unexpected metric value {:?}", other),
            })
            .sum()
    }

    #[test]
    fn test_retry_metric_counts_only_actual_retries() {
        // Success on the third of three attempts: two retries
        assert_eq!(retries_recorded(3), 2);
        // Budget of three spent: the final failure is not followed by a retry
        assert_eq!(retries_recorded(usize::MAX), 2);
        assert_eq!(retries_recorded(1), 0);
    }
}
