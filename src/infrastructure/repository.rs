//! Generic entity repository.
//!
//! `EntityRepository<E>` composes the key-value store, the JSON codec and the
//! collection index into create / read / update / delete / list operations
//! for any [`Entity`] kind.
//!
//! # Consistency
//!
//! A record write and its index update are two separate store calls. The
//! repository keeps them consistent by ordering and compensation:
//!
//! - `create` writes the record first and indexes it second; if either the
//!   write or the indexing fails, the record is deleted again (a failed write
//!   may still have landed).
//! - `delete` removes the index entry first and the record second; if the
//!   record delete fails and the record is still there, the index entry is
//!   restored. Deleting a missing key clears any stale index entry.
//!
//! A reader that lists a key whose record has meanwhile disappeared skips it.
//!
//! Updates are last-write-wins: two concurrent updates of the same key both
//! read, merge and write, and the later write wins as a whole.

use std::marker::PhantomData;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;

use crate::domain::{Entity, EntityKind, EntityPatch, ListFilter, Reference, ValidationError};

use super::codec::{self, CodecError};
use super::index::CollectionIndex;
use super::store::{KeyValueStore, StoreError};

/// Number of record fetches kept in flight while listing.
const LIST_FETCH_CONCURRENCY: usize = 16;

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone)]
pub enum RepositoryError {
    /// A record with this key already exists.
    #[error("{kind} '{key}' already exists")]
    AlreadyExists { kind: EntityKind, key: String },

    /// No record with this key exists.
    #[error("{kind} '{key}' not found")]
    NotFound { kind: EntityKind, key: String },

    /// The stored bytes do not decode into a record.
    #[error("stored {kind} '{key}' is malformed: {reason}")]
    MalformedRecord {
        kind: EntityKind,
        key: String,
        reason: String,
    },

    /// A reference field points at a record that does not exist.
    #[error("{field} refers to unknown {kind} '{key}'")]
    InvalidReference {
        field: &'static str,
        kind: EntityKind,
        key: String,
    },

    /// A domain rule refused the change.
    #[error("{0}")]
    Rejected(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The store failed after retries were exhausted.
    #[error("Key-value store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

// =============================================================================
// Pagination
// =============================================================================

/// Offset/limit window applied to a listing after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Number of matching records to skip.
    pub offset: usize,
    /// Maximum number of records to return; `None` returns the rest.
    pub limit: Option<usize>,
}

impl Pagination {
    #[must_use]
    pub const fn new(offset: usize, limit: Option<usize>) -> Self {
        Self { offset, limit }
    }

    /// Applies the window to an ordered list.
    #[must_use]
    pub fn apply<T>(self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

// =============================================================================
// Entity Repository
// =============================================================================

/// Repository for one entity kind.
pub struct EntityRepository<E> {
    store: Arc<dyn KeyValueStore>,
    index: CollectionIndex,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            index: self.index.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> std::fmt::Debug for EntityRepository<E> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("EntityRepository")
            .field("kind", &E::KIND)
            .finish_non_exhaustive()
    }
}

fn malformed<E: Entity>(key: &str, error: &CodecError) -> RepositoryError {
    RepositoryError::MalformedRecord {
        kind: E::KIND,
        key: key.to_string(),
        reason: error.to_string(),
    }
}

impl<E: Entity> EntityRepository<E> {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let index = CollectionIndex::new(Arc::clone(&store), E::KIND);
        Self {
            store,
            index,
            _entity: PhantomData,
        }
    }

    fn not_found(key: &str) -> RepositoryError {
        RepositoryError::NotFound {
            kind: E::KIND,
            key: key.to_string(),
        }
    }

    /// Stores a new record and indexes it.
    ///
    /// # Errors
    ///
    /// - `Validation` when a field rule is violated
    /// - `InvalidReference` when a referenced record does not exist
    /// - `AlreadyExists` when the key is taken; the stored record is untouched
    /// - `StoreUnavailable` on store failure
    pub async fn create(&self, mut record: E) -> Result<E, RepositoryError> {
        record.assign_key();
        record.validate()?;
        self.ensure_references(&record.references()).await?;

        let key = record.key().to_string();
        let record_key = E::KIND.record_key(&key);
        if self.store.exists(&record_key).await? {
            return Err(RepositoryError::AlreadyExists { kind: E::KIND, key });
        }

        let bytes = codec::encode(&record).map_err(|error| malformed::<E>(&key, &error))?;
        if let Err(error) = self.store.set(&record_key, bytes).await {
            // The write may have landed even though the reply was lost.
            tracing::warn!(
                kind = %E::KIND,
                key = %key,
                error = %error,
                "Record write failed, removing any partial write"
            );
            if let Err(rollback_error) = self.store.delete(&record_key).await {
                tracing::error!(
                    kind = %E::KIND,
                    key = %key,
                    error = %rollback_error,
                    "Compensating delete failed, record may be stored but not indexed"
                );
            }
            return Err(error.into());
        }

        if let Err(error) = self.index.add(&key).await {
            tracing::warn!(
                kind = %E::KIND,
                key = %key,
                error = %error,
                "Index update failed after record write, removing record"
            );
            if let Err(rollback_error) = self.store.delete(&record_key).await {
                tracing::error!(
                    kind = %E::KIND,
                    key = %key,
                    error = %rollback_error,
                    "Compensating delete failed, record is stored but not indexed"
                );
            }
            return Err(error.into());
        }

        tracing::info!(kind = %E::KIND, key = %key, "Record created");
        Ok(record)
    }

    /// Fetches and decodes a single record.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no record is stored under the key
    /// - `MalformedRecord` when the stored bytes do not decode
    /// - `StoreUnavailable` on store failure
    pub async fn get_by_id(&self, key: &str) -> Result<E, RepositoryError> {
        let bytes = self
            .store
            .get(&E::KIND.record_key(key))
            .await?
            .ok_or_else(|| Self::not_found(key))?;
        codec::decode(&bytes).map_err(|error| malformed::<E>(key, &error))
    }

    /// Merges the supplied fields of `patch` into the stored record.
    ///
    /// An empty patch returns the stored record without writing.
    ///
    /// # Errors
    ///
    /// - `NotFound`, `MalformedRecord` as for [`Self::get_by_id`]
    /// - `Validation` when the merged record violates a field rule
    /// - `InvalidReference` when a patched reference does not exist; nothing is written
    /// - `StoreUnavailable` on store failure
    pub async fn update(&self, key: &str, patch: E::Patch) -> Result<E, RepositoryError> {
        let mut record = self.get_by_id(key).await?;
        if patch.is_empty() {
            return Ok(record);
        }

        let references = patch.references();
        patch.apply_to(&mut record);
        record.validate()?;
        self.ensure_references(&references).await?;
        self.write(key, &record).await?;

        tracing::info!(kind = %E::KIND, key = %key, "Record updated");
        Ok(record)
    }

    /// Read-modify-write with a domain rule that may refuse the change.
    ///
    /// # Errors
    ///
    /// - `Rejected` carrying the rule's message; nothing is written
    /// - any error of [`Self::update`]
    pub async fn modify<F, R>(&self, key: &str, change: F) -> Result<E, RepositoryError>
    where
        F: FnOnce(&mut E) -> Result<(), R> + Send,
        R: std::fmt::Display,
    {
        let mut record = self.get_by_id(key).await?;
        change(&mut record).map_err(|error| RepositoryError::Rejected(error.to_string()))?;
        record.validate()?;
        self.write(key, &record).await?;

        tracing::info!(kind = %E::KIND, key = %key, "Record modified");
        Ok(record)
    }

    /// Removes a record and its index entry. Returns the removed key.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no record is stored under the key
    /// - `StoreUnavailable` on store failure
    pub async fn delete(&self, key: &str) -> Result<String, RepositoryError> {
        let record_key = E::KIND.record_key(key);
        if !self.store.exists(&record_key).await? {
            // Clears an index entry left behind by an earlier failed delete.
            self.index.remove(key).await?;
            return Err(Self::not_found(key));
        }

        self.index.remove(key).await?;
        if let Err(error) = self.store.delete(&record_key).await {
            self.restore_index_entry(key, &record_key, &error).await;
            return Err(error.into());
        }

        tracing::info!(kind = %E::KIND, key = %key, "Record deleted");
        Ok(key.to_string())
    }

    /// Lists every indexed record passing `filter`, ordered by key, then
    /// windowed by `pagination`.
    ///
    /// Keys whose record vanished since the index was read are skipped.
    /// Records that fail to decode are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` on store failure.
    pub async fn list_all(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> Result<Vec<E>, RepositoryError> {
        let keys = self.index.list().await?;
        let fetches: Vec<_> = keys
            .iter()
            .map(|key| self.store.get(&E::KIND.record_key(key)))
            .collect();
        let payloads: Vec<Option<Vec<u8>>> = stream::iter(fetches)
            .buffered(LIST_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        let records = keys
            .iter()
            .zip(payloads)
            .filter_map(|(key, payload)| {
                let Some(bytes) = payload else {
                    tracing::debug!(kind = %E::KIND, key = %key, "Indexed record vanished, skipping");
                    return None;
                };
                match codec::decode::<E>(&bytes) {
                    Ok(record) => Some(record),
                    Err(error) => {
                        tracing::error!(
                            kind = %E::KIND,
                            key = %key,
                            error = %error,
                            "Skipping malformed record"
                        );
                        None
                    }
                }
            })
            .filter(|record| record.matches(filter))
            .collect();

        Ok(pagination.apply(records))
    }

    /// Re-indexes `key` after a failed record delete, unless the delete
    /// actually landed.
    async fn restore_index_entry(&self, key: &str, record_key: &str, error: &StoreError) {
        match self.store.exists(record_key).await {
            Ok(false) => {
                tracing::warn!(
                    kind = %E::KIND,
                    key = %key,
                    error = %error,
                    "Record delete reported failure but the record is gone"
                );
                return;
            }
            Ok(true) => {}
            Err(check_error) => {
                tracing::warn!(
                    kind = %E::KIND,
                    key = %key,
                    error = %check_error,
                    "Could not confirm record state after failed delete"
                );
            }
        }

        tracing::warn!(
            kind = %E::KIND,
            key = %key,
            error = %error,
            "Record delete failed after index removal, restoring index entry"
        );
        if let Err(restore_error) = self.index.add(key).await {
            tracing::error!(
                kind = %E::KIND,
                key = %key,
                error = %restore_error,
                "Index restore failed, record is stored but not indexed"
            );
        }
    }

    async fn write(&self, key: &str, record: &E) -> Result<(), RepositoryError> {
        let bytes = codec::encode(record).map_err(|error| malformed::<E>(key, &error))?;
        self.store.set(&E::KIND.record_key(key), bytes).await?;
        Ok(())
    }

    async fn ensure_references(&self, references: &[Reference]) -> Result<(), RepositoryError> {
        for reference in references {
            let exists = self
                .store
                .exists(&reference.kind.record_key(&reference.key))
                .await?;
            if !exists {
                return Err(RepositoryError::InvalidReference {
                    field: reference.field,
                    kind: reference.kind,
                    key: reference.key.clone(),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
