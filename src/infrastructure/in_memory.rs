//! In-memory key-value store.
//!
//! Used for tests and local development. Values and sets live behind a single
//! `Arc<RwLock<...>>`, so every operation is atomic with respect to the others.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::store::{KeyValueStore, StoreFuture};

#[derive(Debug, Default)]
struct State {
    values: HashMap<String, Vec<u8>>,
    sets: HashMap<String, HashSet<String>>,
}

/// In-memory implementation of [`KeyValueStore`].
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> StoreFuture<Option<Vec<u8>>> {
        let state = Arc::clone(&self.state);
        let key = key.to_string();
        Box::pin(async move { Ok(state.read().await.values.get(&key).cloned()) })
    }

    fn set(&self, key: &str, value: Vec<u8>) -> StoreFuture<()> {
        let state = Arc::clone(&self.state);
        let key = key.to_string();
        Box::pin(async move {
            state.write().await.values.insert(key, value);
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> StoreFuture<bool> {
        let state = Arc::clone(&self.state);
        let key = key.to_string();
        Box::pin(async move {
            let mut guard = state.write().await;
            let removed_value = guard.values.remove(&key).is_some();
            let removed_set = guard.sets.remove(&key).is_some();
            Ok(removed_value || removed_set)
        })
    }

    fn exists(&self, key: &str) -> StoreFuture<bool> {
        let state = Arc::clone(&self.state);
        let key = key.to_string();
        Box::pin(async move {
            let guard = state.read().await;
            Ok(guard.values.contains_key(&key) || guard.sets.contains_key(&key))
        })
    }

    fn add_to_set(&self, set_key: &str, member: &str) -> StoreFuture<()> {
        let state = Arc::clone(&self.state);
        let set_key = set_key.to_string();
        let member = member.to_string();
        Box::pin(async move {
            state
                .write()
                .await
                .sets
                .entry(set_key)
                .or_default()
                .insert(member);
            Ok(())
        })
    }

    fn remove_from_set(&self, set_key: &str, member: &str) -> StoreFuture<()> {
        let state = Arc::clone(&self.state);
        let set_key = set_key.to_string();
        let member = member.to_string();
        Box::pin(async move {
            let mut guard = state.write().await;
            if let Some(set) = guard.sets.get_mut(&set_key) {
                set.remove(&member);
                // Redis drops empty sets; mirror that.
                if set.is_empty() {
                    guard.sets.remove(&set_key);
                }
            }
            Ok(())
        })
    }

    fn members_of(&self, set_key: &str) -> StoreFuture<HashSet<String>> {
        let state = Arc::clone(&self.state);
        let set_key = set_key.to_string();
        Box::pin(async move {
            Ok(state
                .read()
                .await
                .sets
                .get(&set_key)
                .cloned()
                .unwrap_or_default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_set_then_get() {
        let store = InMemoryStore::new();
        store.set("machine:SN-1", b"{}".to_vec()).await.unwrap();

        assert_eq!(store.get("machine:SN-1").await.unwrap(), Some(b"{}".to_vec()));
        assert!(store.exists("machine:SN-1").await.unwrap());
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("machine:nope").await.unwrap(), None);
        assert!(!store.exists("machine:nope").await.unwrap());
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_reports_presence() {
        let store = InMemoryStore::new();
        store.set("team:Alfa", b"{}".to_vec()).await.unwrap();

        assert!(store.delete("team:Alfa").await.unwrap());
        assert!(!store.delete("team:Alfa").await.unwrap());
    }

    #[rstest]
    #[tokio::test]
    async fn test_set_operations_are_idempotent() {
        let store = InMemoryStore::new();
        store.add_to_set("teams_list", "Alfa").await.unwrap();
        store.add_to_set("teams_list", "Alfa").await.unwrap();
        store.add_to_set("teams_list", "Beta").await.unwrap();

        let members = store.members_of("teams_list").await.unwrap();
        assert_eq!(members.len(), 2);

        store.remove_from_set("teams_list", "Gama").await.unwrap();
        store.remove_from_set("teams_list", "Alfa").await.unwrap();
        store.remove_from_set("teams_list", "Alfa").await.unwrap();

        let members = store.members_of("teams_list").await.unwrap();
        assert_eq!(members, HashSet::from(["Beta".to_string()]));
    }

    #[rstest]
    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemoryStore::new();
        let clone = store.clone();
        clone.set("user:ana", b"{}".to_vec()).await.unwrap();
        assert!(store.exists("user:ana").await.unwrap());
    }
}
