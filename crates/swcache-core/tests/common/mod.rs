#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use swcache_core::{
    AssetResponse, AssetWorker, CacheMode, CacheStorage, CacheStore, CoreShellList, Error,
    MemoryStorage, Network, Origin, ResourceManifest, Result, StoreHandle,
};

pub const ORIGIN: &str = "https://app.test";

pub fn url(path: &str) -> String {
    if path == "/" {
        format!("{ORIGIN}/")
    } else {
        format!("{ORIGIN}/{path}")
    }
}

pub fn manifest(pairs: &[(&str, &str)]) -> ResourceManifest {
    pairs.iter().copied().collect()
}

/// In-process network answering from a mutable table.
///
/// URLs missing from the table, or explicitly taken offline, fail like an
/// unreachable host.
#[derive(Default)]
pub struct ScriptedNetwork {
    table: Mutex<HashMap<String, AssetResponse>>,
    offline: AtomicBool,
    calls: Mutex<Vec<(String, CacheMode)>>,
}

impl ScriptedNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serve `body` with status 200 at `path`.
    pub fn serve(&self, path: &str, body: &str) {
        self.serve_status(path, 200, body);
    }

    pub fn serve_status(&self, path: &str, status: u16, body: &str) {
        self.table
            .lock()
            .unwrap()
            .insert(url(path), AssetResponse::new(status, body));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// URLs fetched so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn modes(&self) -> Vec<CacheMode> {
        self.calls.lock().unwrap().iter().map(|(_, m)| *m).collect()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, url: &str, mode: CacheMode) -> Result<AssetResponse> {
        self.calls.lock().unwrap().push((url.to_string(), mode));
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Unreachable(format!("offline: {url}")));
        }
        self.table
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Unreachable(format!("no route to {url}")))
    }
}

/// Memory storage whose puts into one slot can be made to fail.
pub struct FlakyStorage {
    inner: MemoryStorage,
    slot: String,
    fail_puts: Arc<AtomicBool>,
}

impl FlakyStorage {
    pub fn new(slot: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStorage::new(),
            slot: slot.to_string(),
            fail_puts: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

struct FlakyStore {
    inner: StoreHandle,
    fail_puts: Arc<AtomicBool>,
}

#[async_trait]
impl CacheStore for FlakyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys().await
    }

    async fn get(&self, url: &str) -> Result<Option<AssetResponse>> {
        self.inner.get(url).await
    }

    async fn put(&self, url: &str, response: &AssetResponse) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("quota exceeded writing {url}")));
        }
        self.inner.put(url, response).await
    }

    async fn delete(&self, url: &str) -> Result<bool> {
        self.inner.delete(url).await
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> Result<StoreHandle> {
        let inner = self.inner.open(name).await?;
        if name != self.slot {
            return Ok(inner);
        }
        let flaky: StoreHandle = Arc::new(FlakyStore {
            inner,
            fail_puts: self.fail_puts.clone(),
        });
        Ok(flaky)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        self.inner.delete(name).await
    }

    async fn names(&self) -> Result<Vec<String>> {
        self.inner.names().await
    }
}

/// Worker for one application version over shared storage and network.
pub fn worker(
    storage: Arc<dyn CacheStorage>,
    network: Arc<ScriptedNetwork>,
    manifest: ResourceManifest,
    shell: &[&str],
) -> AssetWorker {
    AssetWorker::builder(
        Origin::parse(ORIGIN).unwrap(),
        manifest,
        CoreShellList::new(shell.iter().copied()),
    )
    .storage(storage)
    .network(network)
    .build()
    .expect("worker inputs are valid")
}

/// Sorted URLs held by a slot.
pub async fn slot_urls(storage: &dyn CacheStorage, slot: &str) -> Vec<String> {
    if !storage.has(slot).await.unwrap() {
        return Vec::new();
    }
    storage.open(slot).await.unwrap().keys().await.unwrap()
}

pub async fn body(storage: &dyn CacheStorage, slot: &str, path: &str) -> Option<String> {
    storage
        .open(slot)
        .await
        .unwrap()
        .get(&url(path))
        .await
        .unwrap()
        .map(|r| String::from_utf8(r.body).unwrap())
}

pub async fn seed(storage: &dyn CacheStorage, slot: &str, path: &str, body: &str) {
    storage
        .open(slot)
        .await
        .unwrap()
        .put(&url(path), &AssetResponse::ok(body))
        .await
        .unwrap();
}
