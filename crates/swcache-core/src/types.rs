//! Core data types: resource keys, fingerprints, manifests and cached responses.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Reserved key for the top-level document.
pub const ROOT_ALIAS: &str = "/";

/// Logical resource key: a path relative to the app origin, or [`ROOT_ALIAS`].
///
/// ```rust
/// use swcache_core::ResourceKey;
///
/// assert!(ResourceKey::root().is_root());
/// assert_eq!(ResourceKey::new("main.dart.js").as_str(), "main.dart.js");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Create a key from a relative path. An empty path becomes the root alias.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.is_empty() {
            Self::root()
        } else {
            Self(key)
        }
    }

    /// The root alias key.
    #[must_use]
    pub fn root() -> Self {
        Self(ROOT_ALIAS.to_string())
    }

    /// Whether this key is the root alias.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ALIAS
    }

    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Opaque content-identity token (typically a hash emitted by the build).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a fingerprint string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Mapping from resource key to content fingerprint describing the desired cache state.
///
/// Serializes as a flat JSON object, which is also the format of the
/// persisted manifest record.
///
/// ```rust
/// use swcache_core::ResourceManifest;
///
/// let manifest = ResourceManifest::from_json(r#"{"/": "h0", "main.dart.js": "h1"}"#)?;
/// assert_eq!(manifest.len(), 2);
/// assert_eq!(manifest.get("main.dart.js").map(|f| f.as_str()), Some("h1"));
/// # Ok::<(), swcache_core::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest {
    entries: BTreeMap<ResourceKey, Fingerprint>,
}

impl ResourceManifest {
    /// Create an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from its JSON object form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Serialization(format!("Failed to parse manifest: {e}")))
    }

    /// Serialize the manifest to its JSON object form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize manifest: {e}")))
    }

    /// Insert or replace a fingerprint, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<ResourceKey>,
        fingerprint: impl Into<Fingerprint>,
    ) -> Option<Fingerprint> {
        self.entries.insert(key.into(), fingerprint.into())
    }

    /// Look up the fingerprint for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Fingerprint> {
        self.entries.get(key)
    }

    /// Whether the manifest tracks this key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of tracked resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
        self.entries.keys()
    }

    /// Iterate entries in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, &Fingerprint)> {
        self.entries.iter()
    }

    /// Whether a cached copy of `key` made under `previous` is still valid under `self`.
    ///
    /// Fingerprint equality is the only retention criterion: the key must be
    /// present in both manifests with the same fingerprint.
    #[must_use]
    pub fn retains(&self, previous: &Self, key: &str) -> bool {
        match (self.get(key), previous.get(key)) {
            (Some(current), Some(prior)) => current == prior,
            _ => false,
        }
    }

    /// Compare against the manifest that was active before this one.
    #[must_use]
    pub fn diff(&self, previous: &Self) -> ManifestDiff {
        let mut diff = ManifestDiff::default();
        for (key, fingerprint) in &self.entries {
            match previous.get(key.as_str()) {
                None => diff.added.push(key.clone()),
                Some(prior) if prior != fingerprint => diff.changed.push(key.clone()),
                Some(_) => diff.unchanged.push(key.clone()),
            }
        }
        diff.removed = previous
            .keys()
            .filter(|key| !self.contains(key.as_str()))
            .cloned()
            .collect();
        diff
    }
}

impl<K, F> FromIterator<(K, F)> for ResourceManifest
where
    K: Into<ResourceKey>,
    F: Into<Fingerprint>,
{
    fn from_iter<I: IntoIterator<Item = (K, F)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, f)| (k.into(), f.into()))
                .collect(),
        }
    }
}

/// Key-level comparison between two manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDiff {
    /// Keys only in the new manifest.
    pub added: Vec<ResourceKey>,
    /// Keys in both manifests with different fingerprints.
    pub changed: Vec<ResourceKey>,
    /// Keys only in the previous manifest.
    pub removed: Vec<ResourceKey>,
    /// Keys in both manifests with equal fingerprints.
    pub unchanged: Vec<ResourceKey>,
}

impl ManifestDiff {
    /// Whether the two manifests are identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Ordered list of resources that must be available before first paint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoreShellList(Vec<ResourceKey>);

impl CoreShellList {
    /// Build a shell list from keys, preserving order.
    pub fn new<K: Into<ResourceKey>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// Check that every shell resource is tracked by the manifest.
    pub fn validate_against(&self, manifest: &ResourceManifest) -> Result<()> {
        let missing: Vec<&str> = self
            .0
            .iter()
            .map(ResourceKey::as_str)
            .filter(|key| !manifest.contains(key))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "Shell resources missing from manifest: {}",
                missing.join(", ")
            )))
        }
    }

    /// Iterate shell keys in order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceKey> {
        self.0.iter()
    }

    /// Number of shell resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the shell list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An intercepted asset request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    /// HTTP method.
    pub method: reqwest::Method,
    /// Absolute request URL.
    pub url: String,
}

impl AssetRequest {
    /// Build a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: reqwest::Method::GET,
            url: url.into(),
        }
    }

    /// Build a request with an arbitrary method.
    #[must_use]
    pub fn new(method: reqwest::Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }
}

/// A response as stored in, or served from, a cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers worth replaying (lower-cased names).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body.
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl AssetResponse {
    /// Create a response with no headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Create a `200 OK` response.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// Attach a header (name is lower-cased).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}
