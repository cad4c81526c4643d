//! Message event: control requests from the page.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use swcache_core::MessageOutcome;

use crate::context::AppContext;

/// Deliver `payload` as a message event.
pub async fn execute(config: Option<&Path>, payload: &str) -> Result<()> {
    let ctx = AppContext::load(config)?;
    let worker = ctx.worker()?;

    match worker.on_message(payload).await? {
        MessageOutcome::SkippedWaiting => {
            println!("{} Skip-waiting requested", "✓".green());
        },
        MessageOutcome::Downloaded(report) => {
            println!(
                "{} Downloaded {} resource(s) for offline use ({} already cached)",
                "✓".green(),
                report.fetched.len(),
                report.already_cached
            );
            for key in &report.fetched {
                println!("    + {key}");
            }
        },
        MessageOutcome::Ignored => {
            println!("{} Ignored unrecognized message '{}'", "ℹ".blue(), payload);
        },
    }
    Ok(())
}
