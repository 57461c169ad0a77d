//! CLI module
//!
//! Command-line interface over the client.
//!
//! # Commands
//!
//! - `events list` - List account events
//! - `events wait` - Block until an action finishes
//! - `prices` - List network transfer prices
//! - `regions` - List regions
//! - `get <path>` - GET any endpoint

mod commands;
mod runner;

pub use commands::{Cli, Commands, EventsCommand, OutputFormat};
pub use runner::Runner;
