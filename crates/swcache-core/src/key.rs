//! Mapping between request URLs and logical resource keys.
//!
//! Two derivations exist. [`Origin::cache_key`] is used when walking stored
//! entries (reconciliation, offline download) and only strips the origin.
//! [`Origin::request_key`] is used when routing live requests and also drops
//! the `?v=` cache-busting suffix and folds every spelling of the top-level
//! document into the root alias.

use std::fmt;

use url::Url;

use crate::{Error, ResourceKey, Result};

const VERSION_QUERY: &str = "?v=";

/// The origin the cached application is served from, e.g. `https://app.example.com`.
///
/// ```rust
/// use swcache_core::Origin;
///
/// let origin = Origin::parse("https://app.example.com/some/page")?;
/// assert_eq!(origin.as_str(), "https://app.example.com");
///
/// let key = origin.request_key("https://app.example.com/main.dart.js?v=12");
/// assert_eq!(key.as_str(), "main.dart.js");
/// assert!(origin.request_key("https://app.example.com/#/settings").is_root());
/// # Ok::<(), swcache_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    /// Parse an origin from any http(s) URL on it.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "Origin must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(Error::InvalidUrl(format!("Origin has no host: '{input}'")));
        }
        Ok(Self(url.origin().ascii_serialization()))
    }

    /// Get the origin serialization (no trailing slash).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL for a resource key.
    #[must_use]
    pub fn resolve(&self, key: &ResourceKey) -> String {
        if key.is_root() {
            format!("{}/", self.0)
        } else {
            format!("{}/{}", self.0, key.as_str())
        }
    }

    /// Strip `origin/` from a URL, if the URL lives on this origin.
    fn relative<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = url.strip_prefix(self.0.as_str())?;
        if rest.is_empty() {
            return Some(rest);
        }
        rest.strip_prefix('/')
    }

    /// Logical key of a stored entry's URL.
    ///
    /// URLs outside this origin keep their full text and so never match a
    /// manifest key.
    #[must_use]
    pub fn cache_key(&self, url: &str) -> ResourceKey {
        self.relative(url)
            .map_or_else(|| ResourceKey::new(url), ResourceKey::new)
    }

    /// Logical key of a live request's URL.
    #[must_use]
    pub fn request_key(&self, url: &str) -> ResourceKey {
        let Some(relative) = self.relative(url) else {
            return ResourceKey::new(url);
        };
        let key = relative
            .find(VERSION_QUERY)
            .map_or(relative, |idx| &relative[..idx]);

        if url == self.0 || key.is_empty() || key.starts_with('#') {
            ResourceKey::root()
        } else {
            ResourceKey::new(key)
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage form of a request URL: browser caches ignore the fragment.
pub(crate) fn storage_url(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::parse("https://app.example.com").unwrap()
    }

    #[test]
    fn test_parse_keeps_only_origin() {
        assert_eq!(
            Origin::parse("https://app.example.com:8443/index.html?x=1")
                .unwrap()
                .as_str(),
            "https://app.example.com:8443"
        );
        assert_eq!(
            Origin::parse("http://localhost:3000/").unwrap().as_str(),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_parse_rejects_non_http() {
        assert!(Origin::parse("ftp://example.com").is_err());
        assert!(Origin::parse("not a url").is_err());
        assert!(Origin::parse("").is_err());
    }

    #[test]
    fn test_resolve_round_trips_through_cache_key() {
        let origin = origin();
        for key in ["/", "main.dart.js", "assets/fonts/MaterialIcons-Regular.otf"] {
            let key = ResourceKey::from(key);
            assert_eq!(origin.cache_key(&origin.resolve(&key)), key);
        }
        assert_eq!(origin.resolve(&ResourceKey::root()), "https://app.example.com/");
    }

    #[test]
    fn test_cache_key_empty_is_root() {
        let origin = origin();
        assert!(origin.cache_key("https://app.example.com/").is_root());
        assert!(origin.cache_key("https://app.example.com").is_root());
    }

    #[test]
    fn test_cache_key_keeps_query() {
        // Only routing strips version suffixes; stored entries keep their URL.
        let key = origin().cache_key("https://app.example.com/main.dart.js?v=3");
        assert_eq!(key.as_str(), "main.dart.js?v=3");
    }

    #[test]
    fn test_cache_key_foreign_url() {
        let key = origin().cache_key("https://cdn.example.net/lib.js");
        assert_eq!(key.as_str(), "https://cdn.example.net/lib.js");
    }

    #[test]
    fn test_request_key_strips_version_suffix() {
        let origin = origin();
        assert_eq!(
            origin
                .request_key("https://app.example.com/flutter_bootstrap.js?v=abc123")
                .as_str(),
            "flutter_bootstrap.js"
        );
        assert!(origin.request_key("https://app.example.com/?v=42").is_root());
    }

    #[test]
    fn test_request_key_root_spellings() {
        let origin = origin();
        assert!(origin.request_key("https://app.example.com").is_root());
        assert!(origin.request_key("https://app.example.com/").is_root());
        assert!(origin.request_key("https://app.example.com/#/home").is_root());
        assert!(!origin.request_key("https://app.example.com/index.html").is_root());
    }

    #[test]
    fn test_request_key_other_query_kept() {
        let key = origin().request_key("https://app.example.com/api/data?page=2");
        assert_eq!(key.as_str(), "api/data?page=2");
    }

    #[test]
    fn test_request_key_prefix_lookalike_origin() {
        // Shares the origin as a string prefix but is a different host.
        let key = origin().request_key("https://app.example.com.evil.test/main.dart.js");
        assert_eq!(key.as_str(), "https://app.example.com.evil.test/main.dart.js");
    }

    #[test]
    fn test_storage_url_drops_fragment() {
        assert_eq!(storage_url("https://a.test/#/x"), "https://a.test/");
        assert_eq!(storage_url("https://a.test/a.js"), "https://a.test/a.js");
    }
}
