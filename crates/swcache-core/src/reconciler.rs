//! Activation-time reconciliation of the content cache against the manifest.
//!
//! Activation moves through a small state machine:
//!
//! ```text
//! NoManifest ──┐
//!              ├──> Steady
//! Upgrading ───┘
//!     │ any error
//!     └──────────> Failed (all slots wiped)
//! ```
//!
//! The state lives in an [`ActivationGate`]. Activation holds its write half
//! for the whole run, request handling holds the read half, so a fetch never
//! observes a half-reconciled content cache.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, error, info, warn};

use crate::content::ContentCache;
use crate::fetcher::Network;
use crate::manifest_store::ManifestStore;
use crate::staging::StagingCache;
use crate::{CoreShellList, ResourceKey, ResourceManifest, Result};

/// Where the reconciler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileState {
    /// No manifest record exists; the next activation is a fresh install.
    #[default]
    NoManifest,
    /// A prior manifest exists and stale entries are being evicted.
    Upgrading,
    /// Content cache and manifest record agree.
    Steady,
    /// The last activation failed and every slot was wiped.
    Failed,
}

/// Single-flight guard around [`ReconcileState`].
#[derive(Debug, Default)]
pub struct ActivationGate {
    state: RwLock<ReconcileState>,
}

impl ActivationGate {
    /// Create a gate in the [`ReconcileState::NoManifest`] state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state. Waits for a running activation to finish.
    pub async fn state(&self) -> ReconcileState {
        *self.state.read().await
    }

    /// Shared access for request handling.
    pub async fn read(&self) -> RwLockReadGuard<'_, ReconcileState> {
        self.state.read().await
    }
}

/// Which reconciliation procedure ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPath {
    /// No prior manifest: content was rebuilt from staging alone.
    FreshInstall,
    /// Prior manifest differed: stale entries were evicted.
    Upgrade,
    /// Prior manifest was identical to the current one.
    Unchanged,
}

/// Summary of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    /// Procedure that ran.
    pub path: ActivationPath,
    /// Keys of evicted content entries.
    pub evicted: Vec<ResourceKey>,
    /// Number of content entries kept from the previous version.
    pub retained: usize,
    /// Number of staged entries copied into the content cache.
    pub promoted: usize,
}

/// Result of an activation. Failures are absorbed, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActivationOutcome {
    /// Content cache now matches the manifest.
    Reconciled(ActivationReport),
    /// Reconciliation failed and all slots were deleted.
    Wiped {
        /// Display form of the error that caused the wipe.
        reason: String,
    },
}

impl ActivationOutcome {
    /// Whether activation left a consistent cache behind.
    #[must_use]
    pub const fn is_reconciled(&self) -> bool {
        matches!(self, Self::Reconciled(_))
    }
}

/// Installs the core shell and reconciles the content cache on activation.
pub struct Reconciler {
    manifest: Arc<ResourceManifest>,
    shell: CoreShellList,
    manifest_store: ManifestStore,
    staging: StagingCache,
    content: Arc<ContentCache>,
    gate: Arc<ActivationGate>,
}

impl Reconciler {
    /// Assemble a reconciler for one version of the application.
    pub fn new(
        manifest: Arc<ResourceManifest>,
        shell: CoreShellList,
        manifest_store: ManifestStore,
        staging: StagingCache,
        content: Arc<ContentCache>,
        gate: Arc<ActivationGate>,
    ) -> Self {
        Self {
            manifest,
            shell,
            manifest_store,
            staging,
            content,
            gate,
        }
    }

    /// Manifest this version activates.
    #[must_use]
    pub fn manifest(&self) -> &ResourceManifest {
        &self.manifest
    }

    /// Core shell this version installs.
    #[must_use]
    pub const fn shell(&self) -> &CoreShellList {
        &self.shell
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ReconcileState {
        self.gate.state().await
    }

    /// Stage the core shell. Failure aborts the install.
    pub async fn install(&self, network: &dyn Network) -> Result<usize> {
        info!("Installing {} shell files", self.shell.len());
        self.staging.populate(&self.shell, network).await
    }

    /// Reconcile the content cache with the manifest.
    ///
    /// Never fails: any error wipes the content, staging and manifest slots
    /// so the next activation starts over as a fresh install.
    pub async fn activate(&self) -> ActivationOutcome {
        let mut state = self.gate.state.write().await;
        match self.reconcile(&mut state).await {
            Ok(report) => {
                *state = ReconcileState::Steady;
                info!(
                    "Activation complete ({:?}): {} promoted, {} retained, {} evicted",
                    report.path,
                    report.promoted,
                    report.retained,
                    report.evicted.len()
                );
                ActivationOutcome::Reconciled(report)
            },
            Err(err) => {
                *state = ReconcileState::Failed;
                error!("Activation failed, wiping caches ({}): {}", err.category(), err);
                self.wipe().await;
                ActivationOutcome::Wiped {
                    reason: err.to_string(),
                }
            },
        }
    }

    async fn reconcile(&self, state: &mut ReconcileState) -> Result<ActivationReport> {
        let (path, evicted, retained) = match self.manifest_store.load().await? {
            None => {
                *state = ReconcileState::NoManifest;
                debug!("No manifest record, rebuilding {}", self.content.slot());
                self.content.reset().await?;
                (ActivationPath::FreshInstall, Vec::new(), 0)
            },
            Some(previous) => {
                *state = ReconcileState::Upgrading;
                let path = if previous == *self.manifest {
                    ActivationPath::Unchanged
                } else {
                    ActivationPath::Upgrade
                };
                let (evicted, retained) = self.evict_stale(&previous).await?;
                (path, evicted, retained)
            },
        };

        let staged = self.staging.entries().await?;
        for (url, response) in &staged {
            self.content.put(url, response).await?;
        }
        self.staging.discard().await?;
        self.manifest_store.save(&self.manifest).await?;

        Ok(ActivationReport {
            path,
            evicted,
            retained,
            promoted: staged.len(),
        })
    }

    async fn evict_stale(&self, previous: &ResourceManifest) -> Result<(Vec<ResourceKey>, usize)> {
        let mut evicted = Vec::new();
        let mut retained = 0;
        for (url, key) in self.content.entries_by_key().await? {
            if self.manifest.retains(previous, key.as_str()) {
                retained += 1;
            } else {
                self.content.evict(&url).await?;
                evicted.push(key);
            }
        }
        Ok((evicted, retained))
    }

    /// Delete every slot. Failures are logged and otherwise ignored.
    async fn wipe(&self) {
        if let Err(e) = self.content.discard().await {
            warn!("Failed to delete {}: {}", self.content.slot(), e);
        }
        if let Err(e) = self.staging.discard().await {
            warn!("Failed to delete {}: {}", self.staging.slot(), e);
        }
        if let Err(e) = self.manifest_store.clear().await {
            warn!("Failed to delete {}: {}", self.manifest_store.slot(), e);
        }
    }
}
