//! Long-lived slot serving resources to the application.

use std::sync::Arc;

use tracing::debug;

use crate::store::{CacheStorage, StoreHandle};
use crate::{AssetResponse, Origin, ResourceKey, Result};

/// The content slot, addressed by resource key or by URL.
pub struct ContentCache {
    storage: Arc<dyn CacheStorage>,
    slot: String,
    origin: Origin,
}

impl ContentCache {
    /// Bind to the named slot of `storage`.
    pub fn new(storage: Arc<dyn CacheStorage>, slot: impl Into<String>, origin: Origin) -> Self {
        Self {
            storage,
            slot: slot.into(),
            origin,
        }
    }

    /// Slot name.
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Origin entries are stored under.
    #[must_use]
    pub const fn origin(&self) -> &Origin {
        &self.origin
    }

    async fn store(&self) -> Result<StoreHandle> {
        self.storage.open(&self.slot).await
    }

    /// Every stored URL paired with its logical key.
    pub async fn entries_by_key(&self) -> Result<Vec<(String, ResourceKey)>> {
        let store = self.store().await?;
        Ok(store
            .keys()
            .await?
            .into_iter()
            .map(|url| {
                let key = self.origin.cache_key(&url);
                (url, key)
            })
            .collect())
    }

    /// Logical keys of everything stored.
    pub async fn present_keys(&self) -> Result<Vec<ResourceKey>> {
        Ok(self
            .entries_by_key()
            .await?
            .into_iter()
            .map(|(_, key)| key)
            .collect())
    }

    /// Cached response for a URL.
    pub async fn get(&self, url: &str) -> Result<Option<AssetResponse>> {
        self.store().await?.get(url).await
    }

    /// Store a response under a URL, replacing any previous entry.
    pub async fn put(&self, url: &str, response: &AssetResponse) -> Result<()> {
        self.store().await?.put(url, response).await
    }

    /// Remove a single entry.
    pub async fn evict(&self, url: &str) -> Result<bool> {
        let removed = self.store().await?.delete(url).await?;
        if removed {
            debug!("Evicted {}", url);
        }
        Ok(removed)
    }

    /// Delete the whole slot and open it again empty.
    pub async fn reset(&self) -> Result<()> {
        self.storage.delete(&self.slot).await?;
        self.store().await?;
        Ok(())
    }

    /// Drop the slot without recreating it.
    pub async fn discard(&self) -> Result<bool> {
        self.storage.delete(&self.slot).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    fn content(storage: &Arc<MemoryStorage>) -> ContentCache {
        ContentCache::new(
            storage.clone(),
            "app-cache",
            Origin::parse("https://app.test").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_entries_by_key_maps_root_and_foreign() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = content(&storage);
        for url in [
            "https://app.test/",
            "https://app.test/main.dart.js",
            "https://cdn.test/font.woff",
        ] {
            cache.put(url, &AssetResponse::ok("x")).await.unwrap();
        }

        let keys: Vec<String> = cache
            .present_keys()
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.as_str().to_string())
            .collect();
        assert_eq!(keys, vec!["/", "main.dart.js", "https://cdn.test/font.woff"]);
    }

    #[tokio::test]
    async fn test_evict_reports_presence() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = content(&storage);
        cache
            .put("https://app.test/a.js", &AssetResponse::ok("a"))
            .await
            .unwrap();

        assert!(cache.evict("https://app.test/a.js").await.unwrap());
        assert!(!cache.evict("https://app.test/a.js").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_leaves_empty_slot() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = content(&storage);
        cache
            .put("https://app.test/a.js", &AssetResponse::ok("a"))
            .await
            .unwrap();

        cache.reset().await.unwrap();
        assert!(storage.has("app-cache").await.unwrap());
        assert!(cache.entries_by_key().await.unwrap().is_empty());
    }
}
