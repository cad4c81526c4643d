//! Named cache slots holding request URL → response entries.
//!
//! [`CacheStorage`] is the registry of slots (content, staging, manifest
//! record); [`CacheStore`] is a single opened slot. Entries are keyed by the
//! request URL with any `#fragment` removed. Puts are idempotent and
//! last-write-wins, so racing writers for the same URL are harmless.

mod disk;
mod memory;

pub use disk::DiskStorage;
pub use memory::{MemoryStorage, MemoryStore};

use std::sync::Arc;

use async_trait::async_trait;

use crate::{AssetResponse, Result};

/// Shared handle to an opened slot.
pub type StoreHandle = Arc<dyn CacheStore>;

/// A single named cache slot.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Slot name (used for logging).
    fn name(&self) -> &str;

    /// Request URLs of every stored entry.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Look up the entry stored for `url`.
    async fn get(&self, url: &str) -> Result<Option<AssetResponse>>;

    /// Store `response` under `url`, replacing any previous entry.
    async fn put(&self, url: &str, response: &AssetResponse) -> Result<()>;

    /// Remove the entry for `url`. Returns whether an entry was removed.
    async fn delete(&self, url: &str) -> Result<bool>;

    /// Whether an entry exists for `url`.
    async fn contains(&self, url: &str) -> Result<bool> {
        Ok(self.get(url).await?.is_some())
    }
}

/// Registry of named cache slots.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a slot, creating it if it does not exist.
    async fn open(&self, name: &str) -> Result<StoreHandle>;

    /// Whether a slot exists.
    async fn has(&self, name: &str) -> Result<bool>;

    /// Drop a slot and everything in it. Returns whether the slot existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Names of all existing slots.
    async fn names(&self) -> Result<Vec<String>>;
}
