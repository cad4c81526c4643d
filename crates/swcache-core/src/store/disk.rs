//! Filesystem-backed cache storage.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//!   app-cache/
//!     slot.json               # Original slot name
//!     ent_1a2b3c4d5e6f7a8b.body
//!     ent_1a2b3c4d5e6f7a8b.json   # Entry metadata (url, status, headers)
//!   app-temp-cache/
//!   app-manifest/
//! ```
//!
//! Every file is written to a temporary name and renamed into place. An
//! entry exists only while its metadata does: a put removes any previous
//! metadata, commits the body, then commits the new metadata, and a delete
//! removes the metadata before the body. A reader either sees a complete
//! entry or none at all, and a body without metadata is ignored.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tokio::fs;
use tracing::debug;

use super::{CacheStorage, CacheStore, StoreHandle};
use crate::key::storage_url;
use crate::{AssetResponse, Error, Result};

const SLOT_FILE: &str = "slot.json";
const META_EXT: &str = "json";
const BODY_EXT: &str = "body";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotInfo {
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryMeta {
    url: String,
    status: u16,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    stored_at: DateTime<Utc>,
}

/// Durable entry identifier: `ent_<sha256_16>` of the storage URL.
fn entry_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hex = digest.iter().take(8).fold(String::new(), |mut acc, b| {
        // write! to String is infallible
        let _ = write!(acc, "{b:02x}");
        acc
    });
    format!("ent_{hex}")
}

/// Map a slot name onto a predictable, safe directory name.
fn sanitize_slot_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Keep the slot rooted under the storage directory.
    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "_");
    }

    if sanitized.is_empty() || sanitized == "." {
        "_".to_string()
    } else {
        sanitized
    }
}

/// Unique sibling path for an atomic write.
fn tmp_path(path: &Path) -> PathBuf {
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = path
        .file_name()
        .map_or_else(|| "entry".into(), |f| f.to_string_lossy());
    path.with_file_name(format!("{file_name}.{}.{n}.tmp", std::process::id()))
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    fs::write(&tmp, contents)
        .await
        .map_err(|e| Error::Storage(format!("Failed to write {}: {e}", tmp.display())))?;

    #[cfg(target_os = "windows")]
    if fs::try_exists(path).await.unwrap_or(false) {
        fs::remove_file(path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to replace {}: {e}", path.display())))?;
    }

    fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::Storage(format!("Failed to commit {}: {e}", path.display())))
}

async fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Storage(format!(
            "Failed to remove {}: {e}",
            path.display()
        ))),
    }
}

/// One slot directory.
struct DiskStore {
    name: String,
    dir: PathBuf,
}

impl DiskStore {
    fn meta_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{META_EXT}"))
    }

    fn body_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{BODY_EXT}"))
    }

    async fn read_meta(&self, path: &Path) -> Result<Option<EntryMeta>> {
        match fs::read_to_string(path).await {
            Ok(json) => serde_json::from_str(&json).map(Some).map_err(|e| {
                Error::Serialization(format!("Failed to parse {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read slot {}: {e}",
                    self.name
                )));
            },
        };

        let mut urls = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read slot entry: {e}")))?
        {
            let path = entry.path();
            let is_entry_meta = path
                .file_name()
                .and_then(|f| f.to_str())
                .is_some_and(|f| f.starts_with("ent_") && f.ends_with(".json"));
            if !is_entry_meta {
                continue;
            }
            if let Some(meta) = self.read_meta(&path).await? {
                urls.push(meta.url);
            }
        }
        urls.sort();
        Ok(urls)
    }

    async fn get(&self, url: &str) -> Result<Option<AssetResponse>> {
        let url = storage_url(url);
        let id = entry_id(url);
        let Some(meta) = self.read_meta(&self.meta_path(&id)).await? else {
            return Ok(None);
        };
        if meta.url != url {
            debug!("{} in {} collides with {}, treating as a miss", url, self.name, meta.url);
            return Ok(None);
        }
        let body = fs::read(self.body_path(&id)).await.map_err(|e| {
            Error::Storage(format!("Entry {} in {} has no body: {e}", meta.url, self.name))
        })?;
        Ok(Some(AssetResponse {
            status: meta.status,
            headers: meta.headers,
            body,
        }))
    }

    async fn put(&self, url: &str, response: &AssetResponse) -> Result<()> {
        let url = storage_url(url);
        let id = entry_id(url);
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create slot {}: {e}", self.name)))?;

        let meta = EntryMeta {
            url: url.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            stored_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&meta)
            .map_err(|e| Error::Serialization(format!("Failed to serialize entry: {e}")))?;

        let meta_path = self.meta_path(&id);
        remove_if_exists(&meta_path).await?;
        write_atomic(&self.body_path(&id), &response.body).await?;
        write_atomic(&meta_path, &json).await?;
        debug!("Stored {} in {}", url, self.name);
        Ok(())
    }

    async fn delete(&self, url: &str) -> Result<bool> {
        let id = entry_id(storage_url(url));
        let removed = remove_if_exists(&self.meta_path(&id)).await?;
        remove_if_exists(&self.body_path(&id)).await?;
        Ok(removed)
    }
}

/// Filesystem slot registry rooted at a directory.
///
/// ```rust,no_run
/// use swcache_core::{CacheStorage, DiskStorage};
///
/// # async fn example() -> swcache_core::Result<()> {
/// let storage = DiskStorage::new("/var/lib/swcache");
/// let slot = storage.open("app-cache").await?;
/// println!("{} entries", slot.keys().await?.len());
/// # Ok(())
/// # }
/// ```
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Create storage rooted at `root`. Directories are created lazily.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory of this storage.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_dir(&self, name: &str) -> PathBuf {
        self.root.join(sanitize_slot_name(name))
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> Result<StoreHandle> {
        let dir = self.slot_dir(name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create slot {name}: {e}")))?;

        let slot_file = dir.join(SLOT_FILE);
        if !fs::try_exists(&slot_file).await.unwrap_or(false) {
            let info = SlotInfo {
                name: name.to_string(),
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec_pretty(&info)
                .map_err(|e| Error::Serialization(format!("Failed to serialize slot: {e}")))?;
            write_atomic(&slot_file, &json).await?;
        }

        Ok(Arc::new(DiskStore {
            name: name.to_string(),
            dir,
        }))
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.slot_dir(name).join(SLOT_FILE))
            .await
            .unwrap_or(false))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.slot_dir(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Deleted slot {}", name);
                Ok(true)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Storage(format!("Failed to delete slot {name}: {e}"))),
        }
    }

    async fn names(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Storage(format!("Failed to read storage root: {e}"))),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read storage root: {e}")))?
        {
            let slot_file = entry.path().join(SLOT_FILE);
            let Ok(json) = fs::read_to_string(&slot_file).await else {
                continue;
            };
            if let Ok(info) = serde_json::from_str::<SlotInfo>(&json) {
                names.push(info.name);
            }
        }
        names.sort();
        Ok(names)
    }
}
