//! Redis key-value store.
//!
//! This module provides the Redis-backed implementation of [`KeyValueStore`]
//! using `deadpool-redis` for connection pooling.
//!
//! # Key Design
//!
//! - Record: `{prefix}:{key}` -> JSON bytes (`GET`/`SET`/`DEL`)
//! - Collection index: `{collection}_list` -> SET of keys (`SADD`/`SREM`/`SMEMBERS`)

use std::collections::HashSet;

use deadpool_redis::{Config, Connection, Pool, Runtime};
use futures::future::BoxFuture;
use redis::{AsyncCommands, RedisError};

use super::store::{KeyValueStore, StoreError, StoreFuture};

// =============================================================================
// Helper Functions
// =============================================================================

/// Maps a Redis error to a store error, separating transient failures from
/// errors the server returned for the command itself.
fn classify(error: &RedisError) -> StoreError {
    if error.is_timeout()
        || error.is_io_error()
        || error.is_connection_dropped()
        || error.is_connection_refusal()
    {
        StoreError::Unavailable(error.to_string())
    } else {
        StoreError::Command(error.to_string())
    }
}

async fn connection(pool: &Pool) -> Result<Connection, StoreError> {
    pool.get()
        .await
        .map_err(|error| StoreError::Unavailable(error.to_string()))
}

// =============================================================================
// Redis Store
// =============================================================================

/// Redis implementation of [`KeyValueStore`].
///
/// # Example
///
/// ```ignore
/// let store = RedisStore::from_url("redis://localhost:6379")?;
/// store.set("machine:SN-1", bytes).await?;
/// ```
#[derive(Clone)]
pub struct RedisStore {
    /// Connection pool for Redis.
    pool: Pool,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RedisStore")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl RedisStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Creates a store from a Redis URL.
    ///
    /// The pool connects lazily, so an unreachable server is only reported
    /// by the first operation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the pool cannot be created.
    pub fn from_url(redis_url: &str) -> Result<Self, StoreError> {
        let config = Config::from_url(redis_url);
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|error| StoreError::Unavailable(error.to_string()))?;
        Ok(Self { pool })
    }
}

#[allow(clippy::significant_drop_tightening)]
impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> StoreFuture<Option<Vec<u8>>> {
        let pool = self.pool.clone();
        let key = key.to_string();
        Box::pin(async move {
            let mut connection = connection(&pool).await?;
            connection
                .get::<_, Option<Vec<u8>>>(&key)
                .await
                .map_err(|error| classify(&error))
        })
    }

    fn set(&self, key: &str, value: Vec<u8>) -> StoreFuture<()> {
        let pool = self.pool.clone();
        let key = key.to_string();
        Box::pin(async move {
            let mut connection = connection(&pool).await?;
            connection
                .set::<_, _, ()>(&key, value)
                .await
                .map_err(|error| classify(&error))
        })
    }

    fn delete(&self, key: &str) -> StoreFuture<bool> {
        let pool = self.pool.clone();
        let key = key.to_string();
        Box::pin(async move {
            let mut connection = connection(&pool).await?;
            let removed: i64 = connection
                .del(&key)
                .await
                .map_err(|error| classify(&error))?;
            Ok(removed > 0)
        })
    }

    fn exists(&self, key: &str) -> StoreFuture<bool> {
        let pool = self.pool.clone();
        let key = key.to_string();
        Box::pin(async move {
            let mut connection = connection(&pool).await?;
            connection
                .exists::<_, bool>(&key)
                .await
                .map_err(|error| classify(&error))
        })
    }

    fn add_to_set(&self, set_key: &str, member: &str) -> StoreFuture<()> {
        let pool = self.pool.clone();
        let set_key = set_key.to_string();
        let member = member.to_string();
        Box::pin(async move {
            let mut connection = connection(&pool).await?;
            connection
                .sadd::<_, _, ()>(&set_key, &member)
                .await
                .map_err(|error| classify(&error))
        })
    }

    fn remove_from_set(&self, set_key: &str, member: &str) -> StoreFuture<()> {
        let pool = self.pool.clone();
        let set_key = set_key.to_string();
        let member = member.to_string();
        Box::pin(async move {
            let mut connection = connection(&pool).await?;
            connection
                .srem::<_, _, ()>(&set_key, &member)
                .await
                .map_err(|error| classify(&error))
        })
    }

    fn members_of(&self, set_key: &str) -> StoreFuture<HashSet<String>> {
        let pool = self.pool.clone();
        let set_key = set_key.to_string();
        Box::pin(async move {
            let mut connection = connection(&pool).await?;
            connection
                .smembers::<_, HashSet<String>>(&set_key)
                .await
                .map_err(|error| classify(&error))
        })
    }

    fn shutdown(&self) -> BoxFuture<'static, ()> {
        let pool = self.pool.clone();
        Box::pin(async move {
            pool.close();
            tracing::info!("Redis connection pool closed");
        })
    }
}
