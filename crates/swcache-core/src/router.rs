//! Per-request caching policy for intercepted fetches.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::content::ContentCache;
use crate::fetcher::{CacheMode, Network};
use crate::reconciler::ActivationGate;
use crate::{AssetRequest, AssetResponse, Error, ResourceKey, ResourceManifest, Result};

/// How a tracked resource is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicy {
    /// Network first, cached copy when offline. Used for the root document.
    OnlineFirst,
    /// Cached copy first, network on a miss.
    CacheFirst,
}

/// Routing decision for an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Logical key the request maps to.
    pub key: ResourceKey,
    /// Policy that applies to the key.
    pub policy: FetchPolicy,
}

/// Result of an offline download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OfflineReport {
    /// Keys fetched and stored by this download.
    pub fetched: Vec<ResourceKey>,
    /// Keys that were already cached.
    pub already_cached: usize,
}

/// Decides and executes the caching policy for requests against the origin.
pub struct RequestRouter {
    manifest: Arc<ResourceManifest>,
    content: Arc<ContentCache>,
    network: Arc<dyn Network>,
    gate: Arc<ActivationGate>,
}

impl RequestRouter {
    /// Build a router over the content cache.
    pub fn new(
        manifest: Arc<ResourceManifest>,
        content: Arc<ContentCache>,
        network: Arc<dyn Network>,
        gate: Arc<ActivationGate>,
    ) -> Self {
        Self {
            manifest,
            content,
            network,
            gate,
        }
    }

    /// Decide how to serve `request`. `None` means pass-through.
    #[must_use]
    pub fn route(&self, request: &AssetRequest) -> Option<Route> {
        if request.method != reqwest::Method::GET {
            return None;
        }
        let key = self.content.origin().request_key(&request.url);
        if !self.manifest.contains(key.as_str()) {
            return None;
        }
        let policy = if key.is_root() {
            FetchPolicy::OnlineFirst
        } else {
            FetchPolicy::CacheFirst
        };
        Some(Route { key, policy })
    }

    /// Serve `request`, or return `None` so the host fetches it normally.
    pub async fn handle(&self, request: &AssetRequest) -> Option<Result<AssetResponse>> {
        let route = self.route(request)?;
        let _active = self.gate.read().await;
        debug!("Routing {} as {:?}", route.key, route.policy);
        let result = match route.policy {
            FetchPolicy::OnlineFirst => self.online_first(&request.url).await,
            FetchPolicy::CacheFirst => self.cache_first(&request.url).await,
        };
        Some(result)
    }

    async fn online_first(&self, url: &str) -> Result<AssetResponse> {
        match self.network.fetch(url, CacheMode::Default).await {
            Ok(response) => {
                if response.is_success() {
                    self.store(url, &response).await;
                }
                Ok(response)
            },
            Err(err) => {
                debug!("Network failed for {}: {}", url, err);
                match self.content.get(url).await {
                    Ok(Some(cached)) => {
                        info!("Serving cached copy of {} while offline", url);
                        Ok(cached)
                    },
                    Ok(None) => Err(err),
                    Err(cache_err) => {
                        warn!("Cache lookup for {} failed: {}", url, cache_err);
                        Err(err)
                    },
                }
            },
        }
    }

    async fn cache_first(&self, url: &str) -> Result<AssetResponse> {
        match self.content.get(url).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {},
            Err(e) => warn!("Cache lookup for {} failed: {}", url, e),
        }
        let response = self.network.fetch(url, CacheMode::Default).await?;
        if response.is_success() {
            self.store(url, &response).await;
        }
        Ok(response)
    }

    async fn store(&self, url: &str, response: &AssetResponse) {
        if let Err(e) = self.content.put(url, response).await {
            warn!("Failed to cache {}: {}", url, e);
        }
    }

    /// Fetch every tracked resource that is not cached yet.
    ///
    /// All-or-nothing: nothing is stored unless every fetch succeeds with a
    /// success status. Entries already cached are left alone.
    pub async fn download_offline(&self) -> Result<OfflineReport> {
        let _active = self.gate.read().await;
        let present: HashSet<ResourceKey> = self.content.present_keys().await?.into_iter().collect();
        let missing: Vec<&ResourceKey> = self
            .manifest
            .keys()
            .filter(|key| !present.contains(*key))
            .collect();
        let already_cached = self.manifest.len() - missing.len();

        let origin = self.content.origin();
        let downloads = missing.iter().map(|key| {
            let url = origin.resolve(key);
            async move {
                let response = self.network.fetch(&url, CacheMode::Default).await?;
                if !response.is_success() {
                    return Err(Error::Download {
                        url,
                        status: response.status,
                    });
                }
                Ok((url, response))
            }
        });
        let fetched = try_join_all(downloads).await?;

        for (url, response) in &fetched {
            self.content.put(url, response).await?;
        }
        info!(
            "Offline download stored {} resources ({} already cached)",
            fetched.len(),
            already_cached
        );
        Ok(OfflineReport {
            fetched: missing.into_iter().cloned().collect(),
            already_cached,
        })
    }
}
