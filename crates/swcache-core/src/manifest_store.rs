//! Persisted record of the last successfully applied manifest.
//!
//! The record lives in its own slot so that the slot's contents alone tell a
//! first install (no record) from an upgrade. It is written with a single
//! put, so readers see either the previous record in full or nothing.

use std::sync::Arc;

use tracing::debug;

use crate::store::CacheStorage;
use crate::{AssetResponse, Error, ResourceManifest, Result};

/// Entry name of the record inside the manifest slot.
const RECORD_ENTRY: &str = "manifest";

/// Load/save access to the persisted manifest record.
pub struct ManifestStore {
    storage: Arc<dyn CacheStorage>,
    slot: String,
}

impl ManifestStore {
    /// Bind to the named slot of `storage`.
    pub fn new(storage: Arc<dyn CacheStorage>, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
        }
    }

    /// Slot name.
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Load the last committed manifest, or `None` on first install.
    ///
    /// A record that cannot be parsed is an error rather than `None`: an
    /// unreadable record must not be mistaken for a clean first install.
    pub async fn load(&self) -> Result<Option<ResourceManifest>> {
        if !self.storage.has(&self.slot).await? {
            return Ok(None);
        }
        let store = self.storage.open(&self.slot).await?;
        let Some(record) = store.get(RECORD_ENTRY).await? else {
            return Ok(None);
        };
        let json = std::str::from_utf8(&record.body).map_err(|e| {
            Error::Serialization(format!("Manifest record is not UTF-8: {e}"))
        })?;
        ResourceManifest::from_json(json).map(Some)
    }

    /// Commit `manifest` as the current record.
    pub async fn save(&self, manifest: &ResourceManifest) -> Result<()> {
        let json = manifest.to_json()?;
        let store = self.storage.open(&self.slot).await?;
        let record = AssetResponse::ok(json).with_header("content-type", "application/json");
        store.put(RECORD_ENTRY, &record).await?;
        debug!("Persisted manifest with {} resources", manifest.len());
        Ok(())
    }

    /// Drop the record slot entirely.
    pub async fn clear(&self) -> Result<bool> {
        self.storage.delete(&self.slot).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{DiskStorage, MemoryStorage};
    use tempfile::TempDir;

    fn sample() -> ResourceManifest {
        [("/", "h0"), ("main.dart.js", "h1")].into_iter().collect()
    }

    #[tokio::test]
    async fn test_absent_on_first_install() {
        let store = ManifestStore::new(Arc::new(MemoryStorage::new()), "app-manifest");
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_does_not_create_slot() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ManifestStore::new(storage.clone(), "app-manifest");
        store.load().await.unwrap();
        assert!(!storage.has("app-manifest").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = ManifestStore::new(Arc::new(MemoryStorage::new()), "app-manifest");
        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = ManifestStore::new(Arc::new(MemoryStorage::new()), "app-manifest");
        store.save(&sample()).await.unwrap();
        let next: ResourceManifest = [("/", "h9")].into_iter().collect();
        store.save(&next).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(next));
    }

    #[tokio::test]
    async fn test_clear_returns_to_absent() {
        let store = ManifestStore::new(Arc::new(MemoryStorage::new()), "app-manifest");
        store.save(&sample()).await.unwrap();
        assert!(store.clear().await.unwrap());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_error() {
        let storage = Arc::new(MemoryStorage::new());
        let slot = storage.open("app-manifest").await.unwrap();
        slot.put(RECORD_ENTRY, &AssetResponse::ok("{oops"))
            .await
            .unwrap();

        let store = ManifestStore::new(storage, "app-manifest");
        let err = store.load().await.unwrap_err();
        assert_eq!(err.category(), "serialization");
    }

    #[tokio::test]
    async fn test_persists_on_disk() {
        let temp = TempDir::new().unwrap();
        ManifestStore::new(Arc::new(DiskStorage::new(temp.path())), "app-manifest")
            .save(&sample())
            .await
            .unwrap();

        let reloaded = ManifestStore::new(Arc::new(DiskStorage::new(temp.path())), "app-manifest");
        assert_eq!(reloaded.load().await.unwrap(), Some(sample()));
    }
}
