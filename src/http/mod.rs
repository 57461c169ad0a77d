//! HTTP transport module
//!
//! The client never talks to the network directly; it hands an
//! [`HttpRequest`] to a [`Transport`] and gets an [`HttpResponse`] back.
//!
//! # Features
//!
//! - **Pluggable transport**: any `Transport` implementation can be injected
//! - **Automatic Retries**: 429, 503, 408 and "Linode busy." responses
//! - **Hooks**: extra retry conditions, retry delays and request mutation
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Mocking**: `MockTransport` for tests without a network

mod hooks;
mod mock;
mod rate_limit;
mod transport;

pub use hooks::{BeforeRequestHook, RetryAfter, RetryCondition};
pub use mock::MockTransport;
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::{retry_delay, HttpRequest, HttpResponse, ReqwestTransport, Transport};

#[cfg(test)]
mod tests;
