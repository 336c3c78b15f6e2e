//! Key-value store abstraction.
//!
//! The repository layer only needs a handful of primitives: byte values under
//! string keys, plus unordered string sets used as collection indexes. Every
//! operation returns a boxed, `'static` future so implementations can be used
//! as `Arc<dyn KeyValueStore>` and moved freely across tasks.

use std::collections::HashSet;

use futures::future::BoxFuture;
use thiserror::Error;

// =============================================================================
// Store Error
// =============================================================================

/// Errors raised by a key-value store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached (connection refused, pool exhausted, I/O).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The operation did not complete within its deadline.
    #[error("Store operation timed out after {0}ms")]
    Timeout(u64),

    /// The store answered with an error for this command.
    #[error("Store command failed: {0}")]
    Command(String),
}

impl StoreError {
    /// Returns true if the failure is transient and the operation may be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Future returned by every store operation.
pub type StoreFuture<T> = BoxFuture<'static, Result<T, StoreError>>;

// =============================================================================
// Key-Value Store Trait
// =============================================================================

/// Minimal key-value contract the repositories are built on.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value under `key`, or `None` when absent.
    fn get(&self, key: &str) -> StoreFuture<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Vec<u8>) -> StoreFuture<()>;

    /// Removes `key`. Resolves to whether a value was present.
    fn delete(&self, key: &str) -> StoreFuture<bool>;

    fn exists(&self, key: &str) -> StoreFuture<bool>;

    /// Adds `member` to the set under `set_key`. Idempotent.
    fn add_to_set(&self, set_key: &str, member: &str) -> StoreFuture<()>;

    /// Removes `member` from the set under `set_key`. Idempotent.
    fn remove_from_set(&self, set_key: &str, member: &str) -> StoreFuture<()>;

    /// Every member of the set under `set_key`; empty when the set is absent.
    fn members_of(&self, set_key: &str) -> StoreFuture<HashSet<String>>;

    /// Releases connections. Called once at process shutdown.
    fn shutdown(&self) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }
}
