//! Action-completion waiter
//!
//! Polls the newest page of account events until the event for a given
//! entity and action reaches a terminal status, or the timeout elapses.
//!
//! The provider cannot filter events by entity, action or time, so the
//! target is found by scanning page 1 ordered newest-first. A burst of
//! unrelated events can push it off that page; the wait then runs into the
//! timeout.

use super::types::{EntityId, EntityType, Event, EventAction, EventStatus};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::pagination::ListOptions;
use crate::resource::names;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Filter listing events newest-first
pub const LATEST_FIRST_FILTER: &str = r#"{"+order_by":"created","+order":"desc"}"#;

/// State of a wait after one polling cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// No terminal match yet
    Polling,
    /// Matching event finished
    FoundFinished,
    /// Matching event failed
    FoundFailed,
    /// Timeout elapsed without a terminal match
    TimedOut,
    /// Caller cancelled the wait
    Cancelled,
}

impl WaitState {
    /// Check if the wait is over
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Polling)
    }
}

/// Selects the event a wait is watching for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMatcher {
    /// Entity the action applies to
    pub entity_id: EntityId,
    /// Kind of that entity
    pub entity_type: EntityType,
    /// Action to wait for
    pub action: EventAction,
    /// Only events created strictly after this instant match
    pub min_start: DateTime<Utc>,
}

impl EventMatcher {
    /// Create a matcher
    pub fn new(
        entity_id: impl Into<EntityId>,
        entity_type: EntityType,
        action: EventAction,
        min_start: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type,
            action,
            min_start,
        }
    }

    /// Check if `event` is the one being waited for
    pub fn matches(&self, event: &Event) -> bool {
        let Some(entity) = &event.entity else {
            return false;
        };
        event.action == self.action
            && entity.entity_type == self.entity_type
            && entity.id.same_as(&self.entity_id)
            && event.created.is_some_and(|created| created > self.min_start)
    }

    /// First matching event in listing order
    pub fn find<'a>(&self, events: &'a [Event]) -> Option<&'a Event> {
        events.iter().find(|event| self.matches(event))
    }

    /// Decide a polling cycle from the first matching event
    pub fn evaluate<'a>(&self, events: &'a [Event]) -> (WaitState, Option<&'a Event>) {
        match self.find(events) {
            Some(event) => {
                let state = match event.status {
                    EventStatus::Finished => WaitState::FoundFinished,
                    EventStatus::Failed => WaitState::FoundFailed,
                    _ => WaitState::Polling,
                };
                (state, Some(event))
            }
            None => (WaitState::Polling, None),
        }
    }

    fn action_failed(&self) -> Error {
        Error::ActionFailed {
            entity_type: self.entity_type.to_string(),
            entity_id: self.entity_id.to_string(),
            action: self.action.to_string(),
        }
    }

    fn timed_out(&self, timeout: Duration) -> Error {
        Error::WaitTimeout {
            entity_type: self.entity_type.to_string(),
            entity_id: self.entity_id.to_string(),
            action: self.action.to_string(),
            timeout,
        }
    }
}

impl Client {
    /// Wait until `action` on the given entity finishes.
    ///
    /// Returns the finished event, [`Error::ActionFailed`] if it failed,
    /// [`Error::WaitTimeout`] once `timeout` has elapsed, or
    /// [`Error::Cancelled`] when `cancel` fires.
    pub async fn wait_for_event_finished(
        &self,
        entity_id: impl Into<EntityId>,
        entity_type: EntityType,
        action: EventAction,
        min_start: DateTime<Utc>,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Event> {
        let matcher = EventMatcher::new(entity_id, entity_type, action, min_start);
        self.wait_for_event(&matcher, timeout, cancel).await
    }

    /// Wait for the event selected by `matcher` to reach a terminal status
    pub async fn wait_for_event(
        &self,
        matcher: &EventMatcher,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Event> {
        let endpoint = self.resource(names::EVENTS)?.endpoint()?;
        let started = Instant::now();
        let poll_delay = self.poll_delay();

        info!(
            "Waiting up to {:?} for {} on {} {}",
            timeout,
            matcher.action,
            matcher.entity_type,
            matcher.entity_id
        );

        loop {
            let mut options = ListOptions::new(1, LATEST_FIRST_FILTER);
            let events: Vec<Event> = self.list_all(&endpoint, Some(&mut options), cancel).await?;

            match matcher.evaluate(&events) {
                (WaitState::FoundFinished, Some(event)) => {
                    info!(
                        "{} on {} {} finished (event {})",
                        matcher.action, matcher.entity_type, matcher.entity_id, event.id
                    );
                    return Ok(event.clone());
                }
                (WaitState::FoundFailed, _) => return Err(matcher.action_failed()),
                (_, Some(event)) => debug!(
                    "Event {} is {} ({}% complete)",
                    event.id,
                    event.status,
                    event.percent_complete.unwrap_or(0)
                ),
                (_, None) => debug!(
                    "No {} event for {} {} yet",
                    matcher.action, matcher.entity_type, matcher.entity_id
                ),
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(poll_delay) => {}
            }

            if started.elapsed() > timeout {
                return Err(matcher.timed_out(timeout));
            }
        }
    }
}
