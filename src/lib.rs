// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Linode API client
//!
//! An async client for the Linode REST API (v4).
//!
//! ## Features
//!
//! - **Request dispatch**: typed GET/POST/PUT/DELETE with provider error decoding
//! - **Pagination**: fetch every page of a listing, or one explicit page
//! - **Response cache**: TTL cache for read-mostly catalog endpoints
//! - **Event waiter**: block until an asynchronous action finishes or fails
//! - **Cancellation**: every call takes a `CancellationToken`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linode_api::{Client, EntityType, EventAction, Result};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     let cancel = CancellationToken::new();
//!
//!     let regions = client.list_regions(None, &cancel).await?;
//!
//!     let started = chrono::Utc::now();
//!     // ... boot instance 123 ...
//!     let event = client
//!         .wait_for_event_finished(
//!             123_i64,
//!             EntityType::Linode,
//!             EventAction::LinodeBoot,
//!             started,
//!             std::time::Duration::from_secs(300),
//!             &cancel,
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Client                             │
//! │  get / post / put / delete     list_all / list_all_cached    │
//! │  wait_for_event_finished       events, catalog wrappers      │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────┬────────────────────────┐
//! │  Transport   │     Pagination       │       Resources        │
//! ├──────────────┼──────────────────────┼────────────────────────┤
//! │ reqwest      │ page walk            │ name → endpoint        │
//! │ Retry        │ X-Filter             │ path templates         │
//! │ Rate limit   │ TTL cache            │                        │
//! └──────────────┴──────────────────────┴────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration, environment and profiles
pub mod config;

/// HTTP transport with retry and rate limiting
pub mod http;

/// Resource registry and endpoint templates
pub mod resource;

/// API client and request dispatch
pub mod client;

/// Page walking and response cache
pub mod pagination;

/// Account events and the completion waiter
pub mod events;

/// Cached catalog endpoints
pub mod catalog;

/// Instance metadata service client
pub mod metadata;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{ApiError, ApiErrorReason, Error, Result};
pub use types::*;

// Re-export commonly used types
pub use catalog::{NetworkTransferPrice, Region};
pub use client::Client;
pub use config::{ClientConfig, RetryConfig};
pub use events::{EntityId, EntityType, Event, EventAction, EventStatus};
pub use metadata::{MetadataClient, MetadataClientOptions};
pub use pagination::{ListOptions, PageOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
