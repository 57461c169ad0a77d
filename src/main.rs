// Allow common clippy pedantic lints
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! Linode API CLI
//!
//! Command-line interface over the Linode API client

use clap::Parser;
use linode_api::cli::{Cli, Runner};
use linode_api::Client;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let runner = Runner::new(cli);

    let config = match runner.client_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(runner.log_level(&config).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = match Client::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    if let Err(e) = runner.run(&client, &cancel).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
