//! Infrastructure module for the key-value store.
//!
//! This module contains the store abstraction and its backends, the record
//! codec, the collection index and the generic entity repository.

pub mod codec;
pub mod factory;
pub mod in_memory;
pub mod index;
pub mod redis;
pub mod repository;
pub mod retry;
pub mod store;

pub use codec::CodecError;
pub use factory::{
    ConfigurationError, FactoryError, StoreConfig, StoreConfigBuilder, StoreFactory, StoreMode,
};
pub use in_memory::InMemoryStore;
pub use index::CollectionIndex;
pub use redis::RedisStore;
pub use repository::{EntityRepository, Pagination, RepositoryError};
pub use retry::{ResilientStore, RetryPolicy};
pub use store::{KeyValueStore, StoreError, StoreFuture};
