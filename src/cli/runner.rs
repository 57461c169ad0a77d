//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, EventsCommand, OutputFormat};
use crate::client::Client;
use crate::config::{ClientConfig, ENV_CONFIG, ENV_PROFILE};
use crate::error::{Error, Result};
use crate::events::{parse_timestamp, EntityId, EntityType, EventAction, LATEST_FIRST_FILTER};
use crate::pagination::{ListOptions, PageOptions};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Build the client configuration from the environment and CLI flags
    pub fn client_config(&self) -> Result<ClientConfig> {
        self.client_config_from(|key| std::env::var(key).ok())
    }

    /// Build the client configuration through a variable lookup;
    /// `--config` and `--profile` take precedence over the lookup
    pub fn client_config_from<F>(&self, lookup: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = self
            .cli
            .config
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());
        let profile = self.cli.profile.clone();

        ClientConfig::from_lookup(|key| match key {
            ENV_CONFIG if config_path.is_some() => config_path.clone(),
            ENV_PROFILE if profile.is_some() => profile.clone(),
            _ => lookup(key),
        })
    }

    /// Log level for this invocation
    pub fn log_level(&self, config: &ClientConfig) -> Level {
        if self.cli.verbose || config.debug {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    /// Run the CLI command and print its result
    pub async fn run(&self, client: &Client, cancel: &CancellationToken) -> Result<()> {
        let output = self.execute(client, cancel).await?;
        self.print(&output);
        Ok(())
    }

    /// Run the CLI command and return its JSON result
    pub async fn execute(&self, client: &Client, cancel: &CancellationToken) -> Result<Value> {
        match &self.cli.command {
            Commands::Events { command } => self.events(client, command, cancel).await,
            Commands::Prices => to_json(&client.list_network_transfer_prices(None, cancel).await?),
            Commands::Regions => to_json(&client.list_regions(None, cancel).await?),
            Commands::Get { path } => client.get(path.trim_start_matches('/'), cancel).await,
        }
    }

    async fn events(
        &self,
        client: &Client,
        command: &EventsCommand,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        match command {
            EventsCommand::List {
                page,
                page_size,
                filter,
            } => {
                let mut options = ListOptions {
                    page_options: page.map(PageOptions::page),
                    page_size: *page_size,
                    filter: Some(
                        filter
                            .clone()
                            .unwrap_or_else(|| LATEST_FIRST_FILTER.to_string()),
                    ),
                };
                let events = client.list_events(Some(&mut options), cancel).await?;
                info!(
                    "Fetched {} events (page {} of {}, {} total)",
                    events.len(),
                    options.page(),
                    options.pages(),
                    options.results()
                );
                to_json(&events)
            }
            EventsCommand::Wait {
                entity_id,
                entity_type,
                action,
                since,
                timeout,
            } => {
                let min_start = match since {
                    Some(raw) => parse_timestamp(raw).ok_or_else(|| {
                        Error::invalid_value("since", format!("unrecognised timestamp '{raw}'"))
                    })?,
                    None => Utc::now(),
                };
                let entity_id = entity_id
                    .parse::<i64>()
                    .map_or_else(|_| EntityId::from(entity_id.as_str()), EntityId::from);

                let event = client
                    .wait_for_event_finished(
                        entity_id,
                        EntityType::from(entity_type.as_str()),
                        EventAction::from(action.as_str()),
                        min_start,
                        Duration::from_secs(*timeout),
                        cancel,
                    )
                    .await?;
                to_json(&event)
            }
        }
    }

    fn print(&self, value: &Value) {
        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value),
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
        };
        println!("{}", rendered.unwrap_or_default());
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::encode(e.to_string()))
}
