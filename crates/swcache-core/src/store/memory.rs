//! In-memory cache storage for tests and embedders.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStorage, CacheStore, StoreHandle};
use crate::key::storage_url;
use crate::{AssetResponse, Result};

/// In-memory slot.
///
/// Entries live in a `HashMap` behind a [`RwLock`], so every operation works
/// on `&self` without external synchronisation.
pub struct MemoryStore {
    name: String,
    entries: RwLock<HashMap<String, AssetResponse>>,
}

impl MemoryStore {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the slot holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn get(&self, url: &str) -> Result<Option<AssetResponse>> {
        Ok(self.entries.read().await.get(storage_url(url)).cloned())
    }

    async fn put(&self, url: &str, response: &AssetResponse) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(storage_url(url).to_string(), response.clone());
        Ok(())
    }

    async fn delete(&self, url: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(storage_url(url)).is_some())
    }
}

/// In-memory slot registry.
///
/// Deleting a slot detaches it: handles opened earlier keep working but no
/// longer reach the registry, and the next [`open`](CacheStorage::open)
/// creates a fresh, empty slot.
///
/// ```rust
/// use swcache_core::{AssetResponse, CacheStorage, MemoryStorage};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> swcache_core::Result<()> {
/// let storage = MemoryStorage::new();
/// let slot = storage.open("app-cache").await?;
/// slot.put("https://app.test/a.js", &AssetResponse::ok("a")).await?;
/// assert!(slot.contains("https://app.test/a.js").await?);
///
/// storage.delete("app-cache").await?;
/// assert!(!storage.has("app-cache").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, Arc<MemoryStore>>>,
}

impl MemoryStorage {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete handle to a slot, if it exists. Handy for assertions in tests.
    pub async fn slot(&self, name: &str) -> Option<Arc<MemoryStore>> {
        self.slots.read().await.get(name).cloned()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<StoreHandle> {
        let mut slots = self.slots.write().await;
        let slot: StoreHandle = slots
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new(name)))
            .clone();
        Ok(slot)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.slots.read().await.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.slots.write().await.remove(name).is_some())
    }

    async fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.slots.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
