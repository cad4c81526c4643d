//! Transient slot holding freshly downloaded shell files until activation.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::fetcher::{CacheMode, Network};
use crate::store::CacheStorage;
use crate::{AssetResponse, CoreShellList, Error, Origin, Result};

/// Staging slot for the core shell.
pub struct StagingCache {
    storage: Arc<dyn CacheStorage>,
    slot: String,
    origin: Origin,
}

impl StagingCache {
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

    /// Download every shell resource, bypassing intermediate caches.
    ///
    /// All-or-nothing: every fetch must produce a success response before
    /// anything is written. A single failure leaves the slot untouched and is
    /// returned to the caller; there is no internal retry. On success the slot
    /// holds exactly this shell, replacing anything an earlier install staged.
    pub async fn populate(&self, shell: &CoreShellList, network: &dyn Network) -> Result<usize> {
        let downloads = shell.iter().map(|key| {
            let url = self.origin.resolve(key);
            async move {
                let response = network.fetch(&url, CacheMode::Reload).await?;
                if !response.is_success() {
                    return Err(Error::Staging {
                        url,
                        status: response.status,
                    });
                }
                Ok((url, response))
            }
        });
        let fetched = try_join_all(downloads).await?;

        if self.storage.delete(&self.slot).await? {
            debug!("Dropped previously staged files in {}", self.slot);
        }
        let store = self.storage.open(&self.slot).await?;
        for (url, response) in &fetched {
            store.put(url, response).await?;
        }
        info!("Staged {} shell files", fetched.len());
        Ok(fetched.len())
    }

    /// Everything currently staged, as `(url, response)` pairs.
    pub async fn entries(&self) -> Result<Vec<(String, AssetResponse)>> {
        if !self.storage.has(&self.slot).await? {
            return Ok(Vec::new());
        }
        let store = self.storage.open(&self.slot).await?;
        let mut entries = Vec::new();
        for url in store.keys().await? {
            match store.get(&url).await? {
                Some(response) => entries.push((url, response)),
                None => debug!("Staged entry {} vanished while listing", url),
            }
        }
        Ok(entries)
    }

    /// Drop the staging slot.
    pub async fn discard(&self) -> Result<bool> {
        self.storage.delete(&self.slot).await
    }
}
