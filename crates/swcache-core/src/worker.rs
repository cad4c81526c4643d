//! Lifecycle hooks wiring the reconciler and router to a hosting runtime.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::content::ContentCache;
use crate::fetcher::{Fetcher, Network};
use crate::manifest_store::ManifestStore;
use crate::reconciler::{ActivationGate, ActivationOutcome, ReconcileState, Reconciler};
use crate::router::{OfflineReport, RequestRouter};
use crate::staging::StagingCache;
use crate::store::CacheStorage;
use crate::{
    AssetRequest, AssetResponse, CoreShellList, Error, MemoryStorage, Origin, ResourceManifest,
    Result,
};

/// Control operations the hosting runtime exposes to the worker.
#[async_trait]
pub trait HostControl: Send + Sync {
    /// Let a waiting worker version activate without waiting for old clients to close.
    async fn skip_waiting(&self) -> Result<()>;

    /// Take control of every open client.
    async fn claim_clients(&self) -> Result<()>;
}

/// Host that only records requests in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHost;

#[async_trait]
impl HostControl for LoggingHost {
    async fn skip_waiting(&self) -> Result<()> {
        info!("Host asked to skip waiting");
        Ok(())
    }

    async fn claim_clients(&self) -> Result<()> {
        info!("Host asked to claim clients");
        Ok(())
    }
}

/// Names of the three storage slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotNames {
    /// Content cache serving the application.
    pub content: String,
    /// Transient staging area filled during install.
    pub staging: String,
    /// Record of the last applied manifest.
    pub manifest: String,
}

impl Default for SlotNames {
    fn default() -> Self {
        Self {
            content: "app-cache".to_string(),
            staging: "app-temp-cache".to_string(),
            manifest: "app-manifest".to_string(),
        }
    }
}

/// Recognized message payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Activate a waiting version immediately.
    SkipWaiting,
    /// Fetch every tracked resource that is not cached yet.
    DownloadOffline,
}

impl ControlMessage {
    /// Wire form of the message.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SkipWaiting => "skipWaiting",
            Self::DownloadOffline => "downloadOffline",
        }
    }
}

impl FromStr for ControlMessage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skipWaiting" => Ok(Self::SkipWaiting),
            "downloadOffline" => Ok(Self::DownloadOffline),
            other => Err(Error::NotFound(format!("Unknown control message '{other}'"))),
        }
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a message caused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Skip-waiting was requested from the host.
    SkippedWaiting,
    /// An offline download ran.
    Downloaded(OfflineReport),
    /// The payload was not recognized.
    Ignored,
}

/// The asset cache manager for one version of the application.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use swcache_core::{AssetRequest, AssetWorker, CoreShellList, DiskStorage, Origin, ResourceManifest};
///
/// # async fn demo() -> swcache_core::Result<()> {
/// let manifest = ResourceManifest::from_json(r#"{"/": "h0", "main.dart.js": "h1"}"#)?;
/// let worker = AssetWorker::builder(
///     Origin::parse("https://app.example.com")?,
///     manifest,
///     CoreShellList::new(["/", "main.dart.js"]),
/// )
/// .storage(Arc::new(DiskStorage::new("/tmp/swcache")))
/// .build()?;
///
/// worker.on_install().await?;
/// worker.on_activate().await;
/// let served = worker.on_fetch(&AssetRequest::get("https://app.example.com/main.dart.js")).await;
/// assert!(served.is_some());
/// # Ok(())
/// # }
/// ```
pub struct AssetWorker {
    reconciler: Reconciler,
    router: RequestRouter,
    network: Arc<dyn Network>,
    host: Arc<dyn HostControl>,
}

impl AssetWorker {
    /// Start building a worker.
    #[must_use]
    pub fn builder(
        origin: Origin,
        manifest: ResourceManifest,
        shell: CoreShellList,
    ) -> AssetWorkerBuilder {
        AssetWorkerBuilder {
            origin,
            manifest,
            shell,
            slots: SlotNames::default(),
            storage: None,
            network: None,
            host: None,
        }
    }

    /// Reconciler behind the lifecycle hooks.
    #[must_use]
    pub const fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Router behind [`on_fetch`](Self::on_fetch).
    #[must_use]
    pub const fn router(&self) -> &RequestRouter {
        &self.router
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ReconcileState {
        self.reconciler.state().await
    }

    /// Install hook: ask to skip waiting, then stage the core shell.
    pub async fn on_install(&self) -> Result<usize> {
        if let Err(e) = self.host.skip_waiting().await {
            warn!("Skip-waiting request failed: {}", e);
        }
        self.reconciler.install(self.network.as_ref()).await
    }

    /// Activate hook: reconcile, then claim clients if that succeeded.
    pub async fn on_activate(&self) -> ActivationOutcome {
        let outcome = self.reconciler.activate().await;
        if outcome.is_reconciled() {
            if let Err(e) = self.host.claim_clients().await {
                warn!("Claiming clients failed: {}", e);
            }
        }
        outcome
    }

    /// Fetch hook. `None` means the host should fetch the request itself.
    pub async fn on_fetch(&self, request: &AssetRequest) -> Option<Result<AssetResponse>> {
        self.router.handle(request).await
    }

    /// Message hook.
    pub async fn on_message(&self, payload: &str) -> Result<MessageOutcome> {
        let Ok(message) = payload.parse::<ControlMessage>() else {
            debug!("Ignoring message '{}'", payload);
            return Ok(MessageOutcome::Ignored);
        };
        match message {
            ControlMessage::SkipWaiting => {
                self.host.skip_waiting().await?;
                Ok(MessageOutcome::SkippedWaiting)
            },
            ControlMessage::DownloadOffline => {
                let report = self.router.download_offline().await?;
                Ok(MessageOutcome::Downloaded(report))
            },
        }
    }
}

/// Builder for [`AssetWorker`].
pub struct AssetWorkerBuilder {
    origin: Origin,
    manifest: ResourceManifest,
    shell: CoreShellList,
    slots: SlotNames,
    storage: Option<Arc<dyn CacheStorage>>,
    network: Option<Arc<dyn Network>>,
    host: Option<Arc<dyn HostControl>>,
}

impl AssetWorkerBuilder {
    /// Slot names (defaults to `app-cache`, `app-temp-cache`, `app-manifest`).
    #[must_use]
    pub fn slots(mut self, slots: SlotNames) -> Self {
        self.slots = slots;
        self
    }

    /// Cache storage (defaults to an in-memory registry).
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Network used for every fetch (defaults to [`Fetcher`]).
    #[must_use]
    pub fn network(mut self, network: Arc<dyn Network>) -> Self {
        self.network = Some(network);
        self
    }

    /// Hosting runtime controls (defaults to [`LoggingHost`]).
    #[must_use]
    pub fn host(mut self, host: Arc<dyn HostControl>) -> Self {
        self.host = Some(host);
        self
    }

    /// Validate the inputs and assemble the worker.
    pub fn build(self) -> Result<AssetWorker> {
        self.shell.validate_against(&self.manifest)?;

        let storage: Arc<dyn CacheStorage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(MemoryStorage::new()),
        };
        let network: Arc<dyn Network> = match self.network {
            Some(network) => network,
            None => Arc::new(Fetcher::new()?),
        };
        let host: Arc<dyn HostControl> = match self.host {
            Some(host) => host,
            None => Arc::new(LoggingHost),
        };

        let manifest = Arc::new(self.manifest);
        let gate = Arc::new(ActivationGate::new());
        let content = Arc::new(ContentCache::new(
            storage.clone(),
            self.slots.content,
            self.origin.clone(),
        ));
        let reconciler = Reconciler::new(
            manifest.clone(),
            self.shell,
            ManifestStore::new(storage.clone(), self.slots.manifest),
            StagingCache::new(storage, self.slots.staging, self.origin),
            content.clone(),
            gate.clone(),
        );
        let router = RequestRouter::new(manifest, content, network.clone(), gate);

        Ok(AssetWorker {
            reconciler,
            router,
            network,
            host,
        })
    }
}
