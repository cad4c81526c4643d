//! Assembles the cache manager from the configuration file.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use swcache_core::{
    AssetWorker, CacheStorage, Config, CoreShellList, DiskStorage, Fetcher, LoggingHost,
    ResourceManifest,
};
use tracing::debug;

/// Load the configuration from `--config`/`SWCACHE_CONFIG` or the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    Ok(config)
}

/// Disk storage under the configured data root.
pub fn open_storage(config: &Config) -> Arc<DiskStorage> {
    let root = config.data_root();
    debug!("Using cache slots under {}", root.display());
    Arc::new(DiskStorage::new(root))
}

/// Everything a lifecycle command needs.
pub struct AppContext {
    pub config: Config,
    pub storage: Arc<DiskStorage>,
    pub fetcher: Arc<Fetcher>,
    pub manifest: ResourceManifest,
    pub shell: CoreShellList,
}

impl AppContext {
    /// Read the config, manifest and shell, and open storage.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = load_config(path)?;
        let (manifest, shell) = config
            .build_inputs()
            .context("Failed to read build inputs")?;
        let storage = open_storage(&config);
        let fetcher = Arc::new(Fetcher::new()?);
        Ok(Self {
            config,
            storage,
            fetcher,
            manifest,
            shell,
        })
    }

    /// Build the worker for the configured application version.
    pub fn worker(&self) -> Result<AssetWorker> {
        let storage: Arc<dyn CacheStorage> = self.storage.clone();
        let worker = AssetWorker::builder(
            self.config.origin()?,
            self.manifest.clone(),
            self.shell.clone(),
        )
        .slots(self.config.stores.clone())
        .storage(storage)
        .network(self.fetcher.clone())
        .host(Arc::new(LoggingHost))
        .build()?;
        Ok(worker)
    }
}
