//! Delete every cache slot.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use swcache_core::CacheStorage;

use crate::context::{load_config, open_storage};

/// Delete the named slots, returning the ones that existed.
pub async fn clear_named<S>(storage: &S, slots: &[&str]) -> Result<Vec<String>>
where
    S: CacheStorage + ?Sized,
{
    let mut removed = Vec::new();
    for slot in slots {
        if storage.delete(slot).await? {
            removed.push((*slot).to_string());
        }
    }
    Ok(removed)
}

/// Delete the content, staging and manifest slots.
pub async fn execute(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let storage = open_storage(&config);
    let stores = &config.stores;

    let removed = clear_named(
        storage.as_ref(),
        &[
            stores.content.as_str(),
            stores.staging.as_str(),
            stores.manifest.as_str(),
        ],
    )
    .await?;

    if removed.is_empty() {
        println!("{} Cache is already empty", "ℹ".blue());
    } else {
        for slot in &removed {
            println!("  • {slot}");
        }
        println!("{} Cleared {} slot(s)", "✓".green(), removed.len());
    }
    Ok(())
}
