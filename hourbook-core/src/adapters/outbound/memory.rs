use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::outbound::{KeyValueStore, StoreError};

/// Volatile key-value store.
///
/// Used for tests and throwaway sessions. Failures can be injected either for
/// the whole store ([`InMemoryStore::set_offline`]) or per key
/// ([`InMemoryStore::fail_key`]).
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: RwLock<HashMap<String, String>>,
    offline: AtomicBool,
    failing_keys: Mutex<HashSet<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: RwLock::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make every read and write of `key` fail until [`InMemoryStore::heal_key`].
    pub fn fail_key(&self, key: impl Into<String>) {
        if let Ok(mut keys) = self.failing_keys.lock() {
            keys.insert(key.into());
        }
    }

    pub fn heal_key(&self, key: &str) {
        if let Ok(mut keys) = self.failing_keys.lock() {
            keys.remove(key);
        }
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }

    fn check(&self, key: Option<&str>) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory store offline"));
        }
        if let Some(key) = key {
            let failing = self
                .failing_keys
                .lock()
                .map(|keys| keys.contains(key))
                .unwrap_or(false);
            if failing {
                return Err(StoreError::unavailable(format!("key '{key}' unavailable")));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check(Some(key))?;
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check(Some(key))?;
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check(None)?;
        self.values.write().await.clear();
        Ok(())
    }
}
