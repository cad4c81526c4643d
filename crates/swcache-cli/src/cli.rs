//! # CLI Structure and Argument Parsing
//!
//! Each subcommand delivers one lifecycle event to the cache manager, backed
//! by slots on disk, so a full upgrade can be driven from a shell:
//!
//! ```bash
//! swcache --config swcache.toml install
//! swcache --config swcache.toml activate
//! swcache --config swcache.toml fetch https://app.example.com/main.dart.js -o main.dart.js
//! swcache --config swcache.toml message downloadOffline
//! swcache --config swcache.toml status --format json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Main CLI structure for the `swcache` command
#[derive(Parser, Clone, Debug)]
#[command(name = "swcache")]
#[command(version)]
#[command(about = "Versioned offline asset cache for web applications", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, env = "SWCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for reporting commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty text output (default)
    #[default]
    Text,
    /// Single JSON document
    Json,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Download the core shell into the staging slot
    Install,

    /// Reconcile the content cache against the configured manifest
    Activate,

    /// Deliver a fetch event and print or save the response body
    Fetch {
        /// Absolute request URL
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Write the body to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Deliver a message event (`skipWaiting`, `downloadOffline`)
    Message {
        /// Message payload
        payload: String,
    },

    /// Compare the persisted manifest with the configured one
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Delete the content, staging and manifest slots
    Clear,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_defaults_to_get() {
        let cli = Cli::try_parse_from(["swcache", "fetch", "https://app.test/main.dart.js"]).unwrap();
        match cli.command {
            Commands::Fetch { method, output, .. } => {
                assert_eq!(method, "GET");
                assert!(output.is_none());
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["swcache", "status", "--format", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Status {
                format: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["swcache", "-v", "-q", "clear"]).is_err());
    }
}
