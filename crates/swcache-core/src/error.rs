//! Error types and handling for swcache-core operations.
//!
//! Errors are categorized so callers (and logs) can tell a transient network
//! problem apart from a corrupted store or a bad configuration.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: File system operations behind the disk store
//! - **Network Errors**: Asset fetches that never produced a response
//! - **Staging Errors**: A shell resource answered with a non-success status
//! - **Download Errors**: An offline download hit a non-success status
//! - **Storage Errors**: Cache slot reads, writes and deletes
//! - **Serialization Errors**: Persisted manifest or entry metadata is unreadable
//! - **Configuration Errors**: Invalid settings or build inputs
//!
//! ```rust
//! use swcache_core::Error;
//!
//! let err = Error::Unreachable("connection refused".to_string());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "network");
//! ```

use thiserror::Error;

/// The main error type for swcache-core operations.
///
/// Fetch failures are only raised when no response was produced at all; an
/// HTTP error status is an ordinary response and is handled by the routing
/// policy instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed before a response was received.
    ///
    /// Connection and timeout errors are typically recoverable.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Network failure reported by a non-HTTP transport (in-process hosts, tests).
    #[error("Network unreachable: {0}")]
    Unreachable(String),

    /// A core shell resource could not be staged.
    ///
    /// Raised when a shell resource answers with a non-success status during
    /// install. The whole staging step is abandoned.
    #[error("Failed to stage '{url}': server responded with status {status}")]
    Staging {
        /// URL of the shell resource.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// A resource could not be downloaded for offline use.
    ///
    /// Raised when any resource answers with a non-success status during an
    /// offline download. Nothing from that download is stored.
    #[error("Failed to download '{url}' for offline use: server responded with status {status}")]
    Download {
        /// URL of the resource.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// Cache storage operation failed.
    ///
    /// ## Common Causes
    ///
    /// - Slot directory cannot be created or removed
    /// - Entry metadata is missing its body file
    /// - Concurrent removal of a slot while it is being written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is invalid or inaccessible.
    ///
    /// ## Common Causes
    ///
    /// - Invalid TOML syntax in the config file
    /// - Shell list naming a resource that is not in the manifest
    /// - Manifest file missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL is malformed or invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Returns `true` for errors that are typically temporary: connection
    /// failures, timeouts, interrupted I/O, and staging failures (the host
    /// runtime retries installation on its own schedule).
    ///
    /// ```rust
    /// use swcache_core::Error;
    ///
    /// assert!(Error::Staging { url: "https://app.test/main.js".into(), status: 503 }.is_recoverable());
    /// assert!(!Error::Config("missing origin".into()).is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Unreachable(_) | Self::Staging { .. } | Self::Download { .. } => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Useful for structured logging:
    ///
    /// ```rust
    /// use swcache_core::Error;
    ///
    /// let err = Error::Storage("slot vanished".to_string());
    /// assert_eq!(err.category(), "storage");
    /// ```
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) | Self::Unreachable(_) => "network",
            Self::Staging { .. } => "staging",
            Self::Download { .. } => "download",
            Self::Storage(_) => "storage",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::InvalidUrl(_) => "invalid_url",
            Self::NotFound(_) => "not_found",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display_formatting() {
        let errors = vec![
            Error::Storage("disk full".to_string()),
            Error::Config("missing field".to_string()),
            Error::NotFound("manifest".to_string()),
            Error::InvalidUrl("not a url".to_string()),
            Error::Unreachable("offline".to_string()),
            Error::Other("unknown error".to_string()),
        ];

        for error in errors {
            let error_string = error.to_string();
            assert!(!error_string.is_empty());
            match error {
                Error::Storage(msg) => {
                    assert!(error_string.contains("Storage error"));
                    assert!(error_string.contains(&msg));
                },
                Error::Config(msg) => {
                    assert!(error_string.contains("Configuration error"));
                    assert!(error_string.contains(&msg));
                },
                Error::NotFound(msg) => {
                    assert!(error_string.contains("Not found"));
                    assert!(error_string.contains(&msg));
                },
                Error::InvalidUrl(msg) => {
                    assert!(error_string.contains("Invalid URL"));
                    assert!(error_string.contains(&msg));
                },
                Error::Unreachable(msg) => {
                    assert!(error_string.contains("Network unreachable"));
                    assert!(error_string.contains(&msg));
                },
                Error::Other(msg) => assert_eq!(error_string, msg),
                _ => panic!("unexpected variant"),
            }
        }
    }

    #[test]
    fn test_staging_error_mentions_url_and_status() {
        let err = Error::Staging {
            url: "https://app.test/main.dart.js".to_string(),
            status: 404,
        };
        let text = err.to_string();
        assert!(text.contains("main.dart.js"));
        assert!(text.contains("404"));
        assert_eq!(err.category(), "staging");
    }

    #[test]
    fn test_io_recoverability() {
        let timed_out = Error::Io(io::Error::new(io::ErrorKind::TimedOut, "slow disk"));
        let denied = Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(timed_out.is_recoverable());
        assert!(!denied.is_recoverable());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse_err.into();
        assert_eq!(err.category(), "serialization");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_url_error_conversion() {
        let parse_err = url::Url::parse("::nope").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
