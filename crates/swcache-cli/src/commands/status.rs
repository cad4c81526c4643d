//! Report persisted state against the configured application version.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use swcache_core::{CacheStorage, ManifestDiff, ManifestStore};

use crate::cli::OutputFormat;
use crate::context::AppContext;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlotStatus {
    role: &'static str,
    name: String,
    present: bool,
    entries: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    origin: String,
    data_root: String,
    configured_resources: usize,
    persisted_resources: Option<usize>,
    diff: Option<ManifestDiff>,
    up_to_date: bool,
    staging_pending: bool,
    slots: Vec<SlotStatus>,
}

async fn slot_status<S>(storage: &S, role: &'static str, name: &str) -> Result<SlotStatus>
where
    S: CacheStorage + ?Sized,
{
    let present = storage.has(name).await?;
    let entries = if present {
        storage.open(name).await?.keys().await?.len()
    } else {
        0
    };
    Ok(SlotStatus {
        role,
        name: name.to_string(),
        present,
        entries,
    })
}

async fn collect(ctx: &AppContext) -> Result<StatusReport> {
    let stores = &ctx.config.stores;
    let record = ManifestStore::new(ctx.storage.clone(), stores.manifest.clone());
    let persisted = record.load().await?;
    let diff = persisted.as_ref().map(|prior| ctx.manifest.diff(prior));
    let up_to_date = diff.as_ref().is_some_and(ManifestDiff::is_empty);

    let storage = ctx.storage.as_ref();
    let slots = vec![
        slot_status(storage, "content", &stores.content).await?,
        slot_status(storage, "staging", &stores.staging).await?,
        slot_status(storage, "manifest", &stores.manifest).await?,
    ];
    let staging_pending = slots[1].present;

    Ok(StatusReport {
        origin: ctx.config.origin()?.to_string(),
        data_root: ctx.config.data_root().display().to_string(),
        configured_resources: ctx.manifest.len(),
        persisted_resources: persisted.as_ref().map(swcache_core::ResourceManifest::len),
        diff,
        up_to_date,
        staging_pending,
        slots,
    })
}

/// Print the status report.
pub async fn execute(config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let ctx = AppContext::load(config)?;
    let report = collect(&ctx).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report),
    }
    Ok(())
}

fn print_text(report: &StatusReport) {
    println!("{}  {}", "Origin:".bold(), report.origin);
    println!("{}    {}", "Data:".bold(), report.data_root);
    println!(
        "{} {} resource(s) configured",
        "Manifest:".bold(),
        report.configured_resources
    );
    match (&report.diff, report.persisted_resources) {
        (Some(_), Some(persisted)) if report.up_to_date => {
            println!("  {} persisted record matches ({persisted} resources)", "✓".green());
        },
        (Some(diff), Some(persisted)) => {
            println!(
                "  {} persisted record differs ({persisted} resources): {} added, {} changed, {} removed, {} unchanged",
                "⚠".yellow(),
                diff.added.len(),
                diff.changed.len(),
                diff.removed.len(),
                diff.unchanged.len()
            );
        },
        _ => println!(
            "  {} no persisted record (next activation is a fresh install)",
            "ℹ".blue()
        ),
    }

    println!("{}", "Slots:".bold());
    for slot in &report.slots {
        let detail = if slot.present {
            format!("{} entries", slot.entries)
        } else {
            "absent".dimmed().to_string()
        };
        println!("  {:<9} {:<20} {}", slot.role, slot.name, detail);
    }
    if report.staging_pending {
        println!(
            "  {} staged shell files are waiting for `swcache activate`",
            "ℹ".blue()
        );
    }
}
