//! Bounded retry and per-operation deadlines for store access.
//!
//! Every store call is raced against a timeout. Transient failures
//! (`Unavailable`, `Timeout`) are retried with exponential backoff, capped
//! at `max_delay`, for at most `max_attempts` attempts in total. Command
//! errors are returned immediately.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use super::store::{KeyValueStore, StoreError, StoreFuture};

// =============================================================================
// Retry Policy
// =============================================================================

/// Retry schedule and deadline applied to every store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub base_delay: Duration,
    /// Upper bound for a single backoff delay.
    pub max_delay: Duration,
    /// Deadline for a single attempt.
    pub operation_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            operation_timeout: Duration::from_secs(3),
        }
    }
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl RetryPolicy {
    /// A policy that never retries. Timeouts still apply.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff delay after the failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay)
    }

    /// Runs `operation` under this policy.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted, or the first
    /// non-retryable error.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt_fn: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = tokio::time::timeout(self.operation_timeout, attempt_fn())
                .await
                .unwrap_or_else(|_| Err(StoreError::Timeout(as_millis(self.operation_timeout))));

            match outcome {
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = as_millis(delay),
                        error = %error,
                        "Store operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

// =============================================================================
// Resilient Store
// =============================================================================

/// Wraps a store so that every operation runs under a [`RetryPolicy`].
#[derive(Clone)]
pub struct ResilientStore {
    inner: Arc<dyn KeyValueStore>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ResilientStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ResilientStore")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ResilientStore {
    #[must_use]
    pub fn new(inner: Arc<dyn KeyValueStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl KeyValueStore for ResilientStore {
    fn get(&self, key: &str) -> StoreFuture<Option<Vec<u8>>> {
        let inner = Arc::clone(&self.inner);
        let policy = self.policy;
        let key = key.to_string();
        Box::pin(async move { policy.run("get", || inner.get(&key)).await })
    }

    fn set(&self, key: &str, value: Vec<u8>) -> StoreFuture<()> {
        let inner = Arc::clone(&self.inner);
        let policy = self.policy;
        let key = key.to_string();
        Box::pin(async move { policy.run("set", || inner.set(&key, value.clone())).await })
    }

    fn delete(&self, key: &str) -> StoreFuture<bool> {
        let inner = Arc::clone(&self.inner);
        let policy = self.policy;
        let key = key.to_string();
        Box::pin(async move { policy.run("delete", || inner.delete(&key)).await })
    }

    fn exists(&self, key: &str) -> StoreFuture<bool> {
        let inner = Arc::clone(&self.inner);
        let policy = self.policy;
        let key = key.to_string();
        Box::pin(async move { policy.run("exists", || inner.exists(&key)).await })
    }

    fn add_to_set(&self, set_key: &str, member: &str) -> StoreFuture<()> {
        let inner = Arc::clone(&self.inner);
        let policy = self.policy;
        let set_key = set_key.to_string();
        let member = member.to_string();
        Box::pin(async move {
            policy
                .run("add_to_set", || inner.add_to_set(&set_key, &member))
                .await
        })
    }

    fn remove_from_set(&self, set_key: &str, member: &str) -> StoreFuture<()> {
        let inner = Arc::clone(&self.inner);
        let policy = self.policy;
        let set_key = set_key.to_string();
        let member = member.to_string();
        Box::pin(async move {
            policy
                .run("remove_from_set", || inner.remove_from_set(&set_key, &member))
                .await
        })
    }

    fn members_of(&self, set_key: &str) -> StoreFuture<HashSet<String>> {
        let inner = Arc::clone(&self.inner);
        let policy = self.policy;
        let set_key = set_key.to_string();
        Box::pin(async move { policy.run("members_of", || inner.members_of(&set_key)).await })
    }

    fn shutdown(&self) -> BoxFuture<'static, ()> {
        self.inner.shutdown()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryStore;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` reads with `error`, then delegates.
    struct FlakyStore {
        inner: InMemoryStore,
        failures: u32,
        error: StoreError,
        calls: Arc<AtomicU32>,
    }

    impl FlakyStore {
        fn new(failures: u32, error: StoreError) -> Self {
            Self {
                inner: InMemoryStore::new(),
                failures,
                error,
                calls: Arc::new(AtomicU32::new(0)),
            }
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> StoreFuture<Option<Vec<u8>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                let error = self.error.clone();
                return Box::pin(async move { Err(error) });
            }
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: Vec<u8>) -> StoreFuture<()> {
            self.inner.set(key, value)
        }
        fn delete(&self, key: &str) -> StoreFuture<bool> {
            self.inner.delete(key)
        }
        fn exists(&self, key: &str) -> StoreFuture<bool> {
            self.inner.exists(key)
        }
        fn add_to_set(&self, set_key: &str, member: &str) -> StoreFuture<()> {
            self.inner.add_to_set(set_key, member)
        }
        fn remove_from_set(&self, set_key: &str, member: &str) -> StoreFuture<()> {
            self.inner.remove_from_set(set_key, member)
        }
        fn members_of(&self, set_key: &str) -> StoreFuture<HashSet<String>> {
            self.inner.members_of(set_key)
        }
    }

    /// A store whose reads never complete.
    struct HangingStore;

    impl KeyValueStore for HangingStore {
        fn get(&self, _key: &str) -> StoreFuture<Option<Vec<u8>>> {
            Box::pin(futures::future::pending())
        }
        fn set(&self, _key: &str, _value: Vec<u8>) -> StoreFuture<()> {
            Box::pin(futures::future::pending())
        }
        fn delete(&self, _key: &str) -> StoreFuture<bool> {
            Box::pin(futures::future::pending())
        }
        fn exists(&self, _key: &str) -> StoreFuture<bool> {
            Box::pin(futures::future::pending())
        }
        fn add_to_set(&self, _set_key: &str, _member: &str) -> StoreFuture<()> {
            Box::pin(futures::future::pending())
        }
        fn remove_from_set(&self, _set_key: &str, _member: &str) -> StoreFuture<()> {
            Box::pin(futures::future::pending())
        }
        fn members_of(&self, _set_key: &str) -> StoreFuture<HashSet<String>> {
            Box::pin(futures::future::pending())
        }
    }

    #[rstest]
    #[case(1, Duration::from_secs(1))]
    #[case(2, Duration::from_secs(2))]
    #[case(3, Duration::from_secs(4))]
    #[case(4, Duration::from_secs(8))]
    #[case(5, Duration::from_secs(10))]
    #[case(40, Duration::from_secs(10))]
    fn test_delay_doubles_up_to_cap(#[case] attempt: u32, #[case] expected: Duration) {
        assert_eq!(RetryPolicy::default().delay_for(attempt), expected);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried() {
        let flaky = FlakyStore::new(2, StoreError::Unavailable("refused".to_string()));
        let calls = Arc::clone(&flaky.calls);
        flaky.inner.set("team:Alfa", b"{}".to_vec()).await.unwrap();
        let store = ResilientStore::new(Arc::new(flaky), RetryPolicy::default());

        let value = store.get("team:Alfa").await.unwrap();

        assert_eq!(value, Some(b"{}".to_vec()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let flaky = FlakyStore::new(u32::MAX, StoreError::Unavailable("refused".to_string()));
        let calls = Arc::clone(&flaky.calls);
        let store = ResilientStore::new(Arc::new(flaky), RetryPolicy::default());

        let error = store.get("team:Alfa").await.unwrap_err();

        assert!(matches!(error, StoreError::Unavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_command_error_is_not_retried() {
        let flaky = FlakyStore::new(u32::MAX, StoreError::Command("WRONGTYPE".to_string()));
        let calls = Arc::clone(&flaky.calls);
        let store = ResilientStore::new(Arc::new(flaky), RetryPolicy::default());

        let error = store.get("team:Alfa").await.unwrap_err();

        assert!(matches!(error, StoreError::Command(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_hanging_operation_times_out() {
        let store = ResilientStore::new(Arc::new(HangingStore), RetryPolicy::default());

        let error = store.get("team:Alfa").await.unwrap_err();

        assert_eq!(error, StoreError::Timeout(3000));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_for_backoff() {
        let flaky = FlakyStore::new(1, StoreError::Timeout(3000));
        let store = ResilientStore::new(Arc::new(flaky), RetryPolicy::default());
        let started = tokio::time::Instant::now();

        store.get("team:Alfa").await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(1));
    }
}
