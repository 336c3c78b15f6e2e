//! Collection index: the set of live keys of one entity kind.
//!
//! The store cannot enumerate keys by prefix, so each kind keeps its keys in
//! the `{collection}_list` set. The index may briefly disagree with the
//! records after a partial failure; readers tolerate members whose record is
//! missing.

use std::sync::Arc;

use crate::domain::EntityKind;

use super::store::{KeyValueStore, StoreError};

#[derive(Clone)]
pub struct CollectionIndex {
    store: Arc<dyn KeyValueStore>,
    kind: EntityKind,
    set_key: String,
}

impl std::fmt::Debug for CollectionIndex {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CollectionIndex")
            .field("kind", &self.kind)
            .field("set_key", &self.set_key)
            .finish_non_exhaustive()
    }
}

impl CollectionIndex {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, kind: EntityKind) -> Self {
        Self {
            store,
            kind,
            set_key: kind.index_key(),
        }
    }

    /// Adds `key` to the index. Adding an existing key is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn add(&self, key: &str) -> Result<(), StoreError> {
        self.store.add_to_set(&self.set_key, key).await
    }

    /// Removes `key` from the index. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.store.remove_from_set(&self.set_key, key).await
    }

    /// Every indexed key, sorted ascending for a stable listing order.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self
            .store
            .members_of(&self.set_key)
            .await?
            .into_iter()
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }
}
