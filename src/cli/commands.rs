//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Linode API command-line client
#[derive(Parser, Debug)]
#[command(name = "linode-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Profile file (YAML); defaults to $LINODE_CONFIG
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile to use from the profile file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Account events
    Events {
        /// Events command to run
        #[command(subcommand)]
        command: EventsCommand,
    },

    /// List network transfer prices
    Prices,

    /// List regions
    Regions,

    /// GET an arbitrary endpoint and print the body
    Get {
        /// Endpoint path relative to the API root, e.g. `profile`
        path: String,
    },
}

/// `events` subcommands
#[derive(Subcommand, Debug)]
pub enum EventsCommand {
    /// List events, newest first
    List {
        /// Only this page (default: all pages)
        #[arg(long)]
        page: Option<u32>,

        /// Results per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Raw X-Filter expression
        #[arg(long)]
        filter: Option<String>,
    },

    /// Wait for an action on an entity to finish
    Wait {
        /// Entity id
        #[arg(long)]
        entity_id: String,

        /// Entity type, e.g. `linode`
        #[arg(long, default_value = "linode")]
        entity_type: String,

        /// Action, e.g. `linode_boot`
        #[arg(long)]
        action: String,

        /// Only consider events created after this time (RFC 3339 or
        /// `YYYY-MM-DDTHH:MM:SS` UTC); defaults to now
        #[arg(long)]
        since: Option<String>,

        /// Timeout in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
}
