//! API client
//!
//! [`Client`] ties together the immutable configuration, the transport,
//! the resource registry and the response cache. It is cheap to clone;
//! clones share the transport and the cache.
//!
//! The request helpers live in `dispatch`, listing in
//! [`pagination`](crate::pagination) and event waiting in
//! [`events`](crate::events).

mod dispatch;

pub(crate) use dispatch::{decode_body, send_checked};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{ReqwestTransport, Transport};
use crate::pagination::ResponseCache;
use crate::resource::{Resource, ResourceRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Client for the Linode API
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    resources: Arc<ResourceRegistry>,
    cache: Arc<ResponseCache>,
}

impl Client {
    /// Create a client that talks to the API over HTTPS
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        info!("Linode API client targeting {}", transport.root());
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client from `LINODE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let cache = ResponseCache::new(config.cache_ttl);
        Self {
            transport,
            config: Arc::new(config),
            resources: Arc::new(ResourceRegistry::builtin()),
            cache: Arc::new(cache),
        }
    }

    /// Replace the resource registry
    #[must_use]
    pub fn with_resources(mut self, resources: ResourceRegistry) -> Self {
        self.resources = Arc::new(resources);
        self
    }

    /// Configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Delay between event polls
    pub fn poll_delay(&self) -> Duration {
        self.config.poll_delay
    }

    /// Look up a resource by name
    pub fn resource(&self, name: &str) -> Result<&Resource> {
        self.resources.get(name)
    }

    pub(crate) fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport)
            .field("base_url", &self.config.base_url)
            .field("api_version", &self.config.api_version)
            .field("resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
