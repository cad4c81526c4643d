//! Install event: stage the core shell.

use std::path::Path;

use anyhow::{Context as _, Result};
use colored::Colorize;

use crate::context::AppContext;

/// Download every shell file into the staging slot.
pub async fn execute(config: Option<&Path>) -> Result<()> {
    let ctx = AppContext::load(config)?;
    let worker = ctx.worker()?;

    let staged = worker
        .on_install()
        .await
        .context("Install failed; staging was left untouched")?;

    println!(
        "{} Staged {} shell file(s) into {}",
        "✓".green(),
        staged,
        ctx.config.stores.staging.bold()
    );
    println!("  Run `swcache activate` to switch the content cache over.");
    Ok(())
}
