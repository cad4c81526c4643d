//! Configuration for running the cache manager outside a browser.
//!
//! Configuration is a TOML file naming the application origin, the build
//! manifest and the core shell, plus optional slot names and a data root.
//!
//! ```toml
//! [app]
//! origin = "https://app.example.com"
//! manifest = "build/web/asset-manifest.json"
//! shell = ["main.dart.js", "index.html"]
//!
//! [stores]
//! content = "app-cache"
//! staging = "app-temp-cache"
//! manifest = "app-manifest"
//!
//! [paths]
//! root = "/var/lib/swcache"
//! ```
//!
//! A relative `manifest` path is resolved against the directory holding the
//! config file. `SWCACHE_CONFIG` overrides the default config location and
//! `SWCACHE_DATA_DIR` overrides `paths.root`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::worker::SlotNames;
use crate::{CoreShellList, Error, Origin, ResourceManifest, Result};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "SWCACHE_CONFIG";

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "SWCACHE_DATA_DIR";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The application being cached.
    pub app: AppConfig,
    /// Slot names.
    #[serde(default)]
    pub stores: SlotNames,
    /// File system locations.
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// The application being cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the application is served from.
    pub origin: String,
    /// Path to the build manifest (JSON object of path to fingerprint).
    pub manifest: PathBuf,
    /// Resources staged at install, in order.
    #[serde(default)]
    pub shell: Vec<String>,
}

/// File system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the cache slots.
    ///
    /// Default locations:
    /// - Linux: `~/.local/share/swcache`
    /// - macOS: `~/Library/Application Support/dev.swcache.swcache`
    /// - Windows: `%APPDATA%\swcache\swcache\data`
    pub root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: project_dirs().map_or_else(
                || {
                    directories::BaseDirs::new().map_or_else(
                        || PathBuf::from(".swcache"),
                        |base| base.home_dir().join(".swcache"),
                    )
                },
                |dirs| dirs.data_dir().to_path_buf(),
            ),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "swcache", "swcache")
}

impl Config {
    /// Create a configuration with default stores and paths.
    #[must_use]
    pub fn new(app: AppConfig) -> Self {
        Self {
            app,
            stores: SlotNames::default(),
            paths: PathsConfig::default(),
            base_dir: None,
        }
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Load configuration from `SWCACHE_CONFIG` or the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no config file exists there or it cannot be parsed.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Err(Error::Config(format!(
                "No configuration found at {} (set {CONFIG_ENV} or pass --config)",
                path.display()
            )));
        }
        Self::load(&path)
    }

    /// Where [`load_default`](Self::load_default) looks.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let dirs = project_dirs()
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Write the configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns an error if `app.origin` is not an http(s) URL.
    pub fn origin(&self) -> Result<Origin> {
        Origin::parse(&self.app.origin)
    }

    /// Directory holding the cache slots, honouring `SWCACHE_DATA_DIR`.
    #[must_use]
    pub fn data_root(&self) -> PathBuf {
        self.data_root_with(std::env::var_os(DATA_DIR_ENV))
    }

    fn data_root_with(&self, env_override: Option<OsString>) -> PathBuf {
        env_override
            .filter(|p| !p.is_empty())
            .map_or_else(|| self.paths.root.clone(), PathBuf::from)
    }

    /// Manifest path with relative paths resolved against the config file.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        match &self.base_dir {
            Some(base) if self.app.manifest.is_relative() => base.join(&self.app.manifest),
            _ => self.app.manifest.clone(),
        }
    }

    /// Read the manifest and check the shell against it.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is unreadable or malformed, or the
    /// shell names a resource the manifest does not track.
    pub fn build_inputs(&self) -> Result<(ResourceManifest, CoreShellList)> {
        let path = self.manifest_path();
        let json = fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Failed to read manifest {}: {e}", path.display()))
        })?;
        let manifest = ResourceManifest::from_json(&json)?;
        let shell = CoreShellList::new(self.app.shell.iter().map(String::as_str));
        shell.validate_against(&manifest)?;
        Ok((manifest, shell))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "swcache.toml",
            "[app]\norigin = \"https://app.test\"\nmanifest = \"manifest.json\"\n",
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.stores, SlotNames::default());
        assert!(config.app.shell.is_empty());
        assert_eq!(config.manifest_path(), temp.path().join("manifest.json"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "swcache.toml", "[app\norigin = ");
        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(&temp.path().join("absent.toml")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::new(AppConfig {
            origin: "https://app.test".to_string(),
            manifest: PathBuf::from("/srv/app/manifest.json"),
            shell: vec!["main.dart.js".to_string()],
        });
        config.stores.content = "v2-cache".to_string();
        config.paths.root = temp.path().join("data");

        let path = temp.path().join("nested/dir/swcache.toml");
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded.app, config.app);
        assert_eq!(loaded.stores.content, "v2-cache");
        assert_eq!(loaded.paths, config.paths);
        assert_eq!(loaded.manifest_path(), PathBuf::from("/srv/app/manifest.json"));
    }

    #[test]
    fn test_data_root_override() {
        let mut config = Config::new(AppConfig {
            origin: "https://app.test".to_string(),
            manifest: PathBuf::from("manifest.json"),
            shell: Vec::new(),
        });
        config.paths.root = PathBuf::from("/configured");

        assert_eq!(config.data_root_with(None), PathBuf::from("/configured"));
        assert_eq!(
            config.data_root_with(Some(OsString::new())),
            PathBuf::from("/configured")
        );
        assert_eq!(
            config.data_root_with(Some(OsString::from("/override"))),
            PathBuf::from("/override")
        );
    }

    #[test]
    fn test_build_inputs_validates_shell() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "manifest.json", r#"{"/": "h0", "main.dart.js": "h1"}"#);
        let path = write(
            temp.path(),
            "swcache.toml",
            "[app]\norigin = \"https://app.test\"\nmanifest = \"manifest.json\"\nshell = [\"main.dart.js\", \"/\"]\n",
        );

        let (manifest, shell) = Config::load(&path).unwrap().build_inputs().unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(shell.len(), 2);

        let bad = write(
            temp.path(),
            "bad.toml",
            "[app]\norigin = \"https://app.test\"\nmanifest = \"manifest.json\"\nshell = [\"missing.js\"]\n",
        );
        let err = Config::load(&bad).unwrap().build_inputs().unwrap_err();
        assert!(err.to_string().contains("missing.js"));
    }

    #[test]
    fn test_origin_parsed() {
        let config = Config::new(AppConfig {
            origin: "https://app.test/index.html".to_string(),
            manifest: PathBuf::from("manifest.json"),
            shell: Vec::new(),
        });
        assert_eq!(config.origin().unwrap().as_str(), "https://app.test");
    }
}
