//! # swcache-core
//!
//! Versioned offline caching of a web application's assets.
//!
//! A build emits a manifest mapping every resource path to a content
//! fingerprint. On install the core shell is downloaded into a staging slot;
//! on activation the content cache is reconciled against the manifest that
//! was active before, so unchanged resources survive an upgrade and changed
//! or removed ones are evicted. Afterwards every request against the origin
//! is served by a per-resource policy.
//!
//! ## Architecture
//!
//! - **Stores**: Named cache slots, in memory or on disk ([`CacheStorage`])
//! - **Manifest store**: The last successfully applied manifest
//! - **Staging**: All-or-nothing download of the core shell
//! - **Reconciler**: Activation state machine with wipe-on-failure
//! - **Router**: Online-first root document, cache-first everything else
//! - **Worker**: Lifecycle hooks tying it together ([`AssetWorker`])
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use swcache_core::{
//!     AssetRequest, AssetResponse, AssetWorker, CacheMode, CoreShellList, Network, Origin,
//!     ResourceManifest, Result,
//! };
//!
//! struct StaticSite;
//!
//! #[async_trait]
//! impl Network for StaticSite {
//!     async fn fetch(&self, url: &str, _mode: CacheMode) -> Result<AssetResponse> {
//!         Ok(AssetResponse::ok(format!("contents of {url}")))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let manifest = ResourceManifest::from_json(r#"{"/": "h0", "main.dart.js": "h1"}"#)?;
//! let worker = AssetWorker::builder(
//!     Origin::parse("https://app.example.com")?,
//!     manifest,
//!     CoreShellList::new(["/", "main.dart.js"]),
//! )
//! .network(Arc::new(StaticSite))
//! .build()?;
//!
//! worker.on_install().await?;
//! assert!(worker.on_activate().await.is_reconciled());
//!
//! let request = AssetRequest::get("https://app.example.com/main.dart.js?v=3");
//! let response = worker.on_fetch(&request).await.transpose()?;
//! assert_eq!(response.map(|r| r.status), Some(200));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`Result<T, Error>`]. Activation is the
//! exception: it absorbs failures by wiping every slot and reports what
//! happened through [`ActivationOutcome`].

/// Configuration file handling
pub mod config;
/// Content cache slot
pub mod content;
/// Error types and result aliases
pub mod error;
/// Network abstraction and the HTTP fetcher
pub mod fetcher;
/// Mapping between URLs and resource keys
pub mod key;
/// Persisted manifest record
pub mod manifest_store;
/// Activation state machine
pub mod reconciler;
/// Per-request caching policy
pub mod router;
/// Staging slot for the core shell
pub mod staging;
/// Cache slot storage backends
pub mod store;
/// Core data types and structures
pub mod types;
/// Lifecycle hooks and host integration
pub mod worker;

// Re-export commonly used types
pub use config::{AppConfig, Config, PathsConfig};
pub use content::ContentCache;
pub use error::{Error, Result};
pub use fetcher::{CacheMode, Fetcher, Network};
pub use key::Origin;
pub use manifest_store::ManifestStore;
pub use reconciler::{
    ActivationGate, ActivationOutcome, ActivationPath, ActivationReport, ReconcileState,
    Reconciler,
};
pub use router::{FetchPolicy, OfflineReport, RequestRouter, Route};
pub use staging::StagingCache;
pub use store::{CacheStorage, CacheStore, DiskStorage, MemoryStorage, MemoryStore, StoreHandle};
pub use types::*;
pub use worker::{
    AssetWorker, AssetWorkerBuilder, ControlMessage, HostControl, LoggingHost, MessageOutcome,
    SlotNames,
};
