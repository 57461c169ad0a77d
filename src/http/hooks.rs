//! Caller-supplied transport hooks
//!
//! Closures that extend the transport without replacing it: extra retry
//! conditions, a custom retry delay, and request mutation before each
//! attempt.

use super::transport::{HttpRequest, HttpResponse};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type ConditionFn = dyn Fn(&HttpResponse) -> bool + Send + Sync;
type RetryAfterFn = dyn Fn(&HttpResponse, u32) -> Option<Duration> + Send + Sync;
type BeforeRequestFn = dyn Fn(&mut HttpRequest) -> Result<()> + Send + Sync;

/// Extra predicate that marks a response as retryable.
///
/// Checked after the built-in conditions; any match retries.
#[derive(Clone)]
pub struct RetryCondition(Arc<ConditionFn>);

impl RetryCondition {
    /// Wrap a predicate
    pub fn new<F>(condition: F) -> Self
    where
        F: Fn(&HttpResponse) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(condition))
    }

    /// Whether the response should be retried
    pub fn matches(&self, response: &HttpResponse) -> bool {
        (self.0)(response)
    }
}

impl fmt::Debug for RetryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RetryCondition(..)")
    }
}

/// Computes the wait before the next attempt from the failed response and
/// the zero-based attempt number. `None` falls back to the default delay.
#[derive(Clone)]
pub struct RetryAfter(Arc<RetryAfterFn>);

impl RetryAfter {
    /// Wrap a delay function
    pub fn new<F>(delay: F) -> Self
    where
        F: Fn(&HttpResponse, u32) -> Option<Duration> + Send + Sync + 'static,
    {
        Self(Arc::new(delay))
    }

    /// Delay requested for this response, if any
    pub fn delay(&self, response: &HttpResponse, attempt: u32) -> Option<Duration> {
        (self.0)(response, attempt)
    }
}

impl fmt::Debug for RetryAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RetryAfter(..)")
    }
}

/// Runs against every outgoing attempt before it is sent.
///
/// An error aborts the request without touching the network.
#[derive(Clone)]
pub struct BeforeRequestHook(Arc<BeforeRequestFn>);

impl BeforeRequestHook {
    /// Wrap a hook
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    /// Apply the hook to a request
    pub fn apply(&self, request: &mut HttpRequest) -> Result<()> {
        (self.0)(request)
    }
}

impl fmt::Debug for BeforeRequestHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BeforeRequestHook(..)")
    }
}
