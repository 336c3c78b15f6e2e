//! Store factory for runtime backend selection.
//!
//! This module builds the process-wide key-value store from environment
//! configuration. The store is constructed once at startup, wrapped in a
//! [`ResilientStore`] and shared by every request through an `Arc`.
//!
//! # Environment Variables
//!
//! - `STORE_MODE`: `in_memory` (default) | `redis`
//! - `REDIS_URL`: Redis connection URL (required when `STORE_MODE=redis`)
//! - `STORE_RETRY_ATTEMPTS`: attempts per store call (default: 3)
//! - `STORE_RETRY_BASE_DELAY_MS`: first backoff delay (default: 1000)
//! - `STORE_RETRY_MAX_DELAY_MS`: backoff cap (default: 10000)
//! - `STORE_TIMEOUT_MS`: per-attempt timeout (default: 3000)
//!
//! # Example
//!
//! ```ignore
//! let config = StoreConfig::from_env()?;
//! let store = StoreFactory::new(config).create()?;
//! let machines = EntityRepository::<Machine>::new(store);
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::in_memory::InMemoryStore;
use super::redis::RedisStore;
use super::retry::{ResilientStore, RetryPolicy};
use super::store::{KeyValueStore, StoreError};

// =============================================================================
// Configuration Types
// =============================================================================

/// Backend used for records and indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreMode {
    /// In-process hash maps. Suitable for testing and development.
    #[default]
    InMemory,
    /// Redis, for production use.
    Redis,
}

impl FromStr for StoreMode {
    type Err = ConfigurationError;

    /// Parses a store mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStoreMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            _ => Err(ConfigurationError::InvalidStoreMode(value.to_string())),
        }
    }
}

/// Configuration for [`StoreFactory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub mode: StoreMode,
    /// Redis connection URL (required when `mode` is `Redis`).
    pub redis_url: Option<String>,
    pub retry: RetryPolicy,
}

fn parse_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigurationError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigurationError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

impl StoreConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable holds an invalid value or
    /// `REDIS_URL` is missing when `STORE_MODE=redis`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| match env::var(name) {
            Ok(value) => Some(value),
            Err(env::VarError::NotPresent) => None,
            Err(env::VarError::NotUnicode(_)) => Some("<non-UTF-8 value>".to_string()),
        })
    }

    /// Creates a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let mode = match lookup("STORE_MODE") {
            Some(value) => value.parse()?,
            None => StoreMode::default(),
        };

        // Empty or whitespace-only is treated as unset.
        let redis_url = lookup("REDIS_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let defaults = RetryPolicy::default();
        let max_attempts = match lookup("STORE_RETRY_ATTEMPTS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigurationError::InvalidNumber {
                    name: "STORE_RETRY_ATTEMPTS",
                    value,
                })?,
            None => defaults.max_attempts,
        };
        let base_delay =
            parse_millis(&lookup, "STORE_RETRY_BASE_DELAY_MS", defaults.base_delay)?;
        let max_delay = parse_millis(&lookup, "STORE_RETRY_MAX_DELAY_MS", defaults.max_delay)?;
        let operation_timeout =
            parse_millis(&lookup, "STORE_TIMEOUT_MS", defaults.operation_timeout)?;
        let retry = RetryPolicy {
            max_attempts,
            base_delay,
            max_delay,
            operation_timeout,
        };

        let config = Self {
            mode,
            redis_url,
            retry,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the Redis URL is missing for Redis
    /// mode or the retry policy is unusable.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.mode == StoreMode::Redis && self.redis_url.is_none() {
            return Err(ConfigurationError::MissingRedisUrl);
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigurationError::ZeroAttempts);
        }
        if self.retry.operation_timeout.is_zero() {
            return Err(ConfigurationError::ZeroTimeout);
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(ConfigurationError::InvalidBackoff {
                base: self.retry.base_delay,
                max: self.retry.max_delay,
            });
        }
        Ok(())
    }
}

/// Builder for `StoreConfig`.
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::builder()
///     .mode(StoreMode::Redis)
///     .redis_url("redis://localhost:6379")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct StoreConfigBuilder {
    mode: StoreMode,
    redis_url: Option<String>,
    retry: RetryPolicy,
}

impl StoreConfigBuilder {
    #[must_use]
    pub const fn mode(mut self, mode: StoreMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<StoreConfig, ConfigurationError> {
        let config = StoreConfig {
            mode: self.mode,
            redis_url: self.redis_url,
            retry: self.retry,
        };
        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid store mode: '{0}'. Expected 'in_memory' or 'redis'")]
    InvalidStoreMode(String),

    #[error("REDIS_URL environment variable is required when STORE_MODE=redis")]
    MissingRedisUrl,

    #[error("{name} must be a non-negative integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("STORE_RETRY_ATTEMPTS must be at least 1")]
    ZeroAttempts,

    #[error("STORE_TIMEOUT_MS must be greater than 0")]
    ZeroTimeout,

    #[error("Retry base delay {base:?} exceeds the maximum delay {max:?}")]
    InvalidBackoff { base: Duration, max: Duration },
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Redis connection error: {0}")]
    Store(#[from] StoreError),
}

// =============================================================================
// Store Factory
// =============================================================================

/// Builds the configured store.
#[derive(Debug, Clone)]
pub struct StoreFactory {
    config: StoreConfig,
}

impl StoreFactory {
    #[must_use]
    pub const fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Creates the store, wrapped with the configured retry policy.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the configuration is invalid or the Redis
    /// pool cannot be created.
    pub fn create(&self) -> Result<Arc<dyn KeyValueStore>, FactoryError> {
        self.config.validate()?;
        let backend: Arc<dyn KeyValueStore> = match self.config.mode {
            StoreMode::InMemory => Arc::new(InMemoryStore::new()),
            StoreMode::Redis => {
                let url = self
                    .config
                    .redis_url
                    .as_deref()
                    .ok_or(ConfigurationError::MissingRedisUrl)?;
                Arc::new(RedisStore::from_url(url)?)
            }
        };
        Ok(Arc::new(ResilientStore::new(backend, self.config.retry)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let variables: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();
        move |name: &str| variables.get(name).cloned()
    }

    #[rstest]
    #[case("in_memory", StoreMode::InMemory)]
    #[case("memory", StoreMode::InMemory)]
    #[case("REDIS", StoreMode::Redis)]
    #[case(" redis ", StoreMode::Redis)]
    fn test_store_mode_from_str_valid(#[case] input: &str, #[case] expected: StoreMode) {
        assert_eq!(input.parse::<StoreMode>().unwrap(), expected);
    }

    #[rstest]
    #[case("postgres")]
    #[case("")]
    fn test_store_mode_from_str_invalid(#[case] input: &str) {
        assert_eq!(
            input.parse::<StoreMode>(),
            Err(ConfigurationError::InvalidStoreMode(input.to_string()))
        );
    }

    #[rstest]
    fn test_from_lookup_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.operation_timeout, Duration::from_secs(3));
    }

    #[rstest]
    fn test_from_lookup_full() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("STORE_MODE", "redis"),
            ("REDIS_URL", " redis://cache:6379 "),
            ("STORE_RETRY_ATTEMPTS", "5"),
            ("STORE_RETRY_BASE_DELAY_MS", "200"),
            ("STORE_RETRY_MAX_DELAY_MS", "2000"),
            ("STORE_TIMEOUT_MS", "500"),
        ]))
        .unwrap();

        assert_eq!(config.mode, StoreMode::Redis);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(
            config.retry,
            RetryPolicy {
                max_attempts: 5,
                base_delay: Duration::from_millis(200),
                max_delay: Duration::from_millis(2000),
                operation_timeout: Duration::from_millis(500),
            }
        );
    }

    #[rstest]
    #[case(&[("STORE_MODE", "redis")])]
    #[case(&[("STORE_MODE", "redis"), ("REDIS_URL", "   ")])]
    fn test_redis_without_url_is_rejected(#[case] pairs: &[(&str, &str)]) {
        assert_eq!(
            StoreConfig::from_lookup(lookup(pairs)),
            Err(ConfigurationError::MissingRedisUrl)
        );
    }

    #[rstest]
    fn test_invalid_number_is_rejected() {
        let error =
            StoreConfig::from_lookup(lookup(&[("STORE_TIMEOUT_MS", "soon")])).unwrap_err();
        assert_eq!(
            error,
            ConfigurationError::InvalidNumber {
                name: "STORE_TIMEOUT_MS",
                value: "soon".to_string(),
            }
        );
    }

    #[rstest]
    #[case(&[("STORE_RETRY_ATTEMPTS", "0")], ConfigurationError::ZeroAttempts)]
    #[case(&[("STORE_TIMEOUT_MS", "0")], ConfigurationError::ZeroTimeout)]
    fn test_unusable_retry_policy_is_rejected(
        #[case] pairs: &[(&str, &str)],
        #[case] expected: ConfigurationError,
    ) {
        assert_eq!(StoreConfig::from_lookup(lookup(pairs)), Err(expected));
    }

    #[rstest]
    fn test_base_delay_above_cap_is_rejected() {
        let error = StoreConfig::from_lookup(lookup(&[
            ("STORE_RETRY_BASE_DELAY_MS", "5000"),
            ("STORE_RETRY_MAX_DELAY_MS", "1000"),
        ]))
        .unwrap_err();
        assert!(matches!(error, ConfigurationError::InvalidBackoff { .. }));
    }

    #[rstest]
    fn test_builder_missing_redis_url() {
        let result = StoreConfig::builder().mode(StoreMode::Redis).build();
        assert_eq!(result, Err(ConfigurationError::MissingRedisUrl));
    }

    #[rstest]
    fn test_configuration_error_display() {
        assert_eq!(
            ConfigurationError::InvalidStoreMode("mongo".to_string()).to_string(),
            "Invalid store mode: 'mongo'. Expected 'in_memory' or 'redis'"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_factory_creates_functional_in_memory_store() {
        let store = StoreFactory::new(StoreConfig::default()).create().unwrap();

        store.set("team:Alfa", b"{}".to_vec()).await.unwrap();

        assert!(store.exists("team:Alfa").await.unwrap());
    }

    #[rstest]
    fn test_factory_creates_redis_store_lazily() {
        let config = StoreConfig::builder()
            .mode(StoreMode::Redis)
            .redis_url("redis://localhost:6379")
            .build()
            .unwrap();
        assert!(StoreFactory::new(config).create().is_ok());
    }
}
