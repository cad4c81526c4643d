//! swcache CLI - drive the offline asset cache lifecycle from a shell
//!
//! This is the main entry point for the swcache command-line interface.
//! Command implementations live in separate modules.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;
mod utils;

use cli::{Cli, Commands};
use utils::logging::initialize_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    execute_command(cli).await
}

async fn execute_command(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Install => commands::install(config).await,
        Commands::Activate => commands::activate(config).await,
        Commands::Fetch {
            url,
            method,
            output,
        } => commands::fetch(config, &url, &method, output).await,
        Commands::Message { payload } => commands::message(config, &payload).await,
        Commands::Status { format } => commands::show_status(config, format).await,
        Commands::Clear => commands::clear_slots(config).await,
    }
}
