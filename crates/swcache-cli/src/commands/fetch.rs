//! Fetch event: serve one request through the cache manager.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use colored::Colorize;
use reqwest::Method;
use swcache_core::{AssetRequest, FetchPolicy};

use crate::context::AppContext;

/// Serve `url` as an intercepted request.
///
/// Requests the manager does not handle go straight to the network, as they
/// would in a browser.
pub async fn execute(
    config: Option<&Path>,
    url: &str,
    method: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let method: Method = method
        .to_ascii_uppercase()
        .parse()
        .with_context(|| format!("Invalid HTTP method '{method}'"))?;
    let ctx = AppContext::load(config)?;
    let worker = ctx.worker()?;
    let request = AssetRequest::new(method, url);

    let served_by = match worker.router().route(&request) {
        Some(route) => match route.policy {
            FetchPolicy::OnlineFirst => "online-first",
            FetchPolicy::CacheFirst => "cache-first",
        },
        None => "network",
    };
    let response = match worker.on_fetch(&request).await {
        Some(result) => result?,
        None => ctx.fetcher.passthrough(&request).await?,
    };

    let status = if (200..300).contains(&response.status) {
        response.status.to_string().as_str().green()
    } else {
        response.status.to_string().as_str().red()
    };
    eprintln!("{} {} ({}, {} bytes)", status, url, served_by, response.body.len());

    match output {
        Some(path) => {
            std::fs::write(&path, &response.body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("  Saved to {}", path.display());
        },
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&response.body)?;
            stdout.flush()?;
        },
    }
    Ok(())
}
