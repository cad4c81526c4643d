#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use assert_cmd::Command;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Manifest used by the fixture application.
pub const MANIFEST: &str = r#"{
  "/": "h0",
  "main.dart.js": "h1",
  "assets/logo.png": "h2"
}"#;

/// A config file, manifest and data directory in one temp dir.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new(origin: &str) -> Self {
        Self::with_manifest(origin, MANIFEST)
    }

    pub fn with_manifest(origin: &str, manifest: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create fixture dir");
        std::fs::write(dir.path().join("asset-manifest.json"), manifest).unwrap();
        std::fs::write(
            dir.path().join("swcache.toml"),
            format!(
                "[app]\norigin = \"{origin}\"\nmanifest = \"asset-manifest.json\"\nshell = [\"main.dart.js\", \"/\"]\n"
            ),
        )
        .unwrap();
        Self { dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("swcache.toml")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join("asset-manifest.json")
    }

    /// `swcache --config <fixture> <args>`
    pub fn cmd(&self, args: &[&str]) -> Command {
        let mut cmd = swcache_cmd(&self.data_dir());
        cmd.arg("--config").arg(self.config_path()).args(args);
        cmd
    }
}

pub fn swcache_cmd(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("swcache"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("SWCACHE_CONFIG");
    cmd.env("SWCACHE_DATA_DIR", data_dir);
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Serve `body` at `route` for GET requests.
pub async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serve the fixture application's three resources.
pub async fn serve_app(server: &MockServer) {
    serve(server, "/", "<html>app</html>").await;
    serve(server, "/main.dart.js", "void main() {}").await;
    serve(server, "/assets/logo.png", "PNG").await;
}
