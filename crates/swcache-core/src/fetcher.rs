use crate::{AssetRequest, AssetResponse, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use reqwest::header::{CACHE_CONTROL, HeaderMap, PRAGMA};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Response headers copied into cached entries.
const REPLAYED_HEADERS: &[&str] = &[
    "content-type",
    "content-language",
    "etag",
    "last-modified",
];

/// How a fetch interacts with intermediate HTTP caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Normal fetch; intermediaries may answer from their caches.
    #[default]
    Default,
    /// Force a full network fetch, bypassing any intermediate cache.
    Reload,
}

/// The network path used for asset fetches.
///
/// A transport failure is an `Err`; every HTTP status, including errors, is
/// an `Ok` response so the routing policy can decide what to do with it.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch `url` with the given cache mode.
    async fn fetch(&self, url: &str, mode: CacheMode) -> Result<AssetResponse>;
}

/// HTTP client for fetching application assets
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a new fetcher with no request timeout
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// Creates a new fetcher with a request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("swcache/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client })
    }
}

fn replayed_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    REPLAYED_HEADERS
        .iter()
        .filter_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(|v| ((*name).to_string(), v.to_string()))
        })
        .collect()
}

impl Fetcher {
    /// Send a request the manager does not handle, exactly as given.
    pub async fn passthrough(&self, request: &AssetRequest) -> Result<AssetResponse> {
        Self::send(self.client.request(request.method.clone(), &request.url), &request.url).await
    }

    async fn send(request: RequestBuilder, url: &str) -> Result<AssetResponse> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = replayed_headers(response.headers());
        let body = response.bytes().await?.to_vec();

        debug!("Fetched {} bytes from {} ({})", body.len(), url, status);

        Ok(AssetResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Network for Fetcher {
    async fn fetch(&self, url: &str, mode: CacheMode) -> Result<AssetResponse> {
        let mut request = self.client.get(url);
        if mode == CacheMode::Reload {
            debug!("Bypassing intermediate caches for {}", url);
            request = request
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache");
        }
        Self::send(request, url).await
    }
}

// Note: Default is not implemented as Fetcher::new() can fail.
// Use Fetcher::new() directly and handle the Result.
