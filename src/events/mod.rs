//! Account events
//!
//! Every asynchronous action the provider performs (boot, resize, disk
//! creation...) is reported as an [`Event`] on `account/events`. This module
//! wraps that endpoint and provides the completion waiter built on it.

mod types;
mod waiter;

pub use types::{
    parse_timestamp, EntityId, EntityType, Event, EventAction, EventEntity, EventStatus,
    TIMESTAMP_FORMAT,
};
pub use waiter::{EventMatcher, WaitState, LATEST_FIRST_FILTER};

use crate::client::Client;
use crate::error::Result;
use crate::pagination::ListOptions;
use crate::resource::names;
use serde::de::IgnoredAny;
use tokio_util::sync::CancellationToken;

impl Client {
    /// List account events
    pub async fn list_events(
        &self,
        options: Option<&mut ListOptions>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Event>> {
        let endpoint = self.resource(names::EVENTS)?.endpoint()?;
        self.list_all(&endpoint, options, cancel).await
    }

    /// Fetch a single event
    pub async fn get_event(&self, event_id: u64, cancel: &CancellationToken) -> Result<Event> {
        let endpoint = self.resource(names::EVENTS)?.endpoint_with_id(event_id)?;
        self.get(&endpoint, cancel).await
    }

    /// Mark one event as read
    pub async fn mark_event_read(&self, event_id: u64, cancel: &CancellationToken) -> Result<()> {
        self.post_event_flag(event_id, "read", cancel).await
    }

    /// Mark an event and every older event as seen
    pub async fn mark_events_seen(&self, event_id: u64, cancel: &CancellationToken) -> Result<()> {
        self.post_event_flag(event_id, "seen", cancel).await
    }

    async fn post_event_flag(
        &self,
        event_id: u64,
        flag: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let endpoint = self.resource(names::EVENTS)?.endpoint_with_id(event_id)?;
        let _: IgnoredAny = self
            .post::<IgnoredAny, ()>(&format!("{endpoint}/{flag}"), None, cancel)
            .await?;
        Ok(())
    }
}
