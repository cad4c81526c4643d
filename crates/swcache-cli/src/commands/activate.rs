//! Activate event: reconcile the content cache.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use swcache_core::{ActivationOutcome, ActivationPath, ActivationReport};

use crate::context::AppContext;

/// Reconcile the content cache against the configured manifest.
///
/// A failed reconciliation is reported but does not fail the command: the
/// caches have been wiped and the next activation starts from scratch.
pub async fn execute(config: Option<&Path>) -> Result<()> {
    let ctx = AppContext::load(config)?;
    let worker = ctx.worker()?;

    match worker.on_activate().await {
        ActivationOutcome::Reconciled(report) => print_report(&report, &ctx.config.stores.content),
        ActivationOutcome::Wiped { reason } => {
            println!("{} Activation failed: {}", "✗".red(), reason);
            println!("  All cache slots were deleted; the next activation is a fresh install.");
        },
    }
    Ok(())
}

fn print_report(report: &ActivationReport, content_slot: &str) {
    let path = match report.path {
        ActivationPath::FreshInstall => "fresh install",
        ActivationPath::Upgrade => "upgrade",
        ActivationPath::Unchanged => "manifest unchanged",
    };
    println!(
        "{} Activated {} ({})",
        "✓".green(),
        content_slot.bold(),
        path
    );
    println!("  Promoted: {}", report.promoted);
    println!("  Retained: {}", report.retained);
    println!("  Evicted:  {}", report.evicted.len());
    for key in &report.evicted {
        println!("    - {key}");
    }
}
