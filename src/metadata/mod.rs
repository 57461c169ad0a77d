//! Instance metadata service client
//!
//! Talks to the link-local metadata service available from inside an
//! instance. Requests carry a short-lived `X-Metadata-Token` instead of a
//! personal access token; [`MetadataClient::new`] generates one unless
//! token initialisation is disabled.
//!
//! The same [`Transport`] seam and error translation as the main
//! [`Client`](crate::Client) are used, so retries, rate limiting and
//! [`ApiError`](crate::ApiError) decoding behave identically.

mod types;

pub use types::{IpNet, Ipv4Data, Ipv6Data, NetworkData, SshKeysData, SshKeysUsers};

use crate::client::{decode_body, send_checked};
use crate::config::{parse_bool, ClientConfig, ENV_DEBUG};
use crate::error::{Error, Result};
use crate::http::{HttpRequest, ReqwestTransport, Transport};
use crate::types::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Link-local address of the metadata service
pub const METADATA_HOST: &str = "169.254.169.254";
/// Scheme the metadata service is served over
pub const METADATA_SCHEME: &str = "http";
/// Metadata API version
pub const METADATA_VERSION: &str = "v1";
/// Header carrying the metadata token
pub const TOKEN_HEADER: &str = "X-Metadata-Token";
/// Header requesting a token lifetime in seconds
pub const TOKEN_EXPIRY_HEADER: &str = "X-Metadata-Token-Expiry-Seconds";
/// Token lifetime used when none is requested
pub const DEFAULT_TOKEN_EXPIRY: Duration = Duration::from_secs(3600);

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain";

// ============================================================================
// Options
// ============================================================================

/// Construction options for [`MetadataClient`]
#[derive(Debug, Clone, Default)]
pub struct MetadataClientOptions {
    /// Replaces scheme, host and path prefix (`http://localhost:8080/meta`)
    pub base_url: Option<String>,
    /// Replaces the API version segment
    pub version: Option<String>,
    /// Replaces the scheme, applied after `base_url`
    pub scheme: Option<String>,
    /// Skip token generation on construction
    pub disable_token_init: bool,
    /// Log request and response details at debug level
    pub debug: bool,
}

impl MetadataClientOptions {
    /// Options with `debug` read from `LINODE_DEBUG`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Options with `debug` read through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        if let Some(value) = lookup(ENV_DEBUG) {
            options.debug = parse_bool(&value)
                .ok_or_else(|| Error::invalid_value(ENV_DEBUG, "expected 0, 1, true or false"))?;
        }
        Ok(options)
    }

    /// Scheme-and-host part and version segment of the service URL
    fn endpoint_parts(&self) -> Result<(String, String)> {
        let mut scheme = METADATA_SCHEME.to_string();
        let mut host = METADATA_HOST.to_string();

        if let Some(base) = self.base_url.as_deref().filter(|b| !b.is_empty()) {
            let url = Url::parse(base)?;
            scheme = url.scheme().to_string();
            host = url.host_str().unwrap_or_default().to_string();
            if let Some(port) = url.port() {
                host = format!("{host}:{port}");
            }
            host.push_str(url.path().trim_end_matches('/'));
        }
        if let Some(overridden) = self.scheme.as_deref().filter(|s| !s.is_empty()) {
            scheme = overridden.to_string();
        }

        let version = self
            .version
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(METADATA_VERSION)
            .trim_matches('/')
            .to_string();

        Ok((format!("{scheme}://{host}"), version))
    }

    /// Full service root, such as `http://169.254.169.254/v1`
    pub fn root_url(&self) -> Result<String> {
        let (base, version) = self.endpoint_parts()?;
        Ok(format!("{base}/{version}"))
    }
}

/// Options for [`MetadataClient::generate_token`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateTokenOptions {
    /// Requested lifetime; [`DEFAULT_TOKEN_EXPIRY`] when unset
    pub expiry: Option<Duration>,
}

// ============================================================================
// Client
// ============================================================================

/// Client for the instance metadata service
#[derive(Clone)]
pub struct MetadataClient {
    transport: Arc<dyn Transport>,
    root: String,
    token: Option<String>,
}

impl MetadataClient {
    /// Connect to the metadata service over HTTP and, unless disabled,
    /// generate a token for subsequent requests
    pub async fn new(options: MetadataClientOptions, cancel: &CancellationToken) -> Result<Self> {
        let (base, version) = options.endpoint_parts()?;
        let config = ClientConfig::builder()
            .base_url(base)
            .api_version(version)
            .debug(options.debug)
            .build();
        let transport = ReqwestTransport::new(&config)?;
        info!("Metadata client targeting {}", transport.root());

        Self::with_transport(options, Arc::new(transport), cancel).await
    }

    /// Build a client over an arbitrary transport
    pub async fn with_transport(
        options: MetadataClientOptions,
        transport: Arc<dyn Transport>,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let mut client = Self {
            transport,
            root: options.root_url()?,
            token: None,
        };

        if !options.disable_token_init {
            let token = client
                .generate_token(GenerateTokenOptions::default(), cancel)
                .await?;
            client.use_token(token);
        }

        Ok(client)
    }

    /// Send `token` with every subsequent request
    pub fn use_token(&mut self, token: impl Into<String>) -> &mut Self {
        self.token = Some(token.into());
        self
    }

    /// Whether requests carry a metadata token
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Service root this client targets
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Create a metadata token valid for the requested lifetime
    pub async fn generate_token(
        &self,
        options: GenerateTokenOptions,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let expiry = options.expiry.unwrap_or(DEFAULT_TOKEN_EXPIRY);
        let request = self
            .request(Method::PUT, "token", TEXT_CONTENT_TYPE)
            .header(TOKEN_EXPIRY_HEADER, expiry.as_secs().to_string());

        let response = send_checked(self.transport.as_ref(), request, cancel).await?;
        debug!("Generated metadata token valid for {:?}", expiry);
        body_text(&response.body)
    }

    /// Raw user data the instance was deployed with
    pub async fn get_user_data(&self, cancel: &CancellationToken) -> Result<String> {
        let request = self.request(Method::GET, "user-data", TEXT_CONTENT_TYPE);
        let response = send_checked(self.transport.as_ref(), request, cancel).await?;
        body_text(&response.body)
    }

    /// Network configuration of the instance
    pub async fn get_network(&self, cancel: &CancellationToken) -> Result<NetworkData> {
        let request = self.request(Method::GET, "network", JSON_CONTENT_TYPE);
        let response = send_checked(self.transport.as_ref(), request, cancel).await?;
        decode_body(&response.body)
    }

    /// SSH keys configured for the instance
    pub async fn get_ssh_keys(&self, cancel: &CancellationToken) -> Result<SshKeysData> {
        let request = self.request(Method::GET, "ssh-keys", JSON_CONTENT_TYPE);
        let response = send_checked(self.transport.as_ref(), request, cancel).await?;
        decode_body(&response.body)
    }

    fn request(&self, method: Method, path: &str, content_type: &str) -> HttpRequest {
        let request = HttpRequest::new(method, path)
            .header("Accept", content_type)
            .header("Content-Type", content_type);
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token.as_str()),
            None => request,
        }
    }
}

impl std::fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClient")
            .field("transport", &self.transport)
            .field("root", &self.root)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

fn body_text(body: &[u8]) -> Result<String> {
    String::from_utf8(body.to_vec()).map_err(|e| Error::decode(e.to_string()))
}

#[cfg(test)]
mod tests;
