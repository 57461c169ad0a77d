//! HTTP transport
//!
//! The [`Transport`] trait is the only way the client talks to the network.
//! [`ReqwestTransport`] is the production implementation and handles:
//! - Bearer authentication, user agent and default headers
//! - Custom root certificates
//! - Automatic retries for throttling and "busy" responses
//! - Caller-supplied retry conditions and before-request hooks
//! - Client-side rate limiting
//!
//! Status codes are never turned into errors here; a response that is
//! still failing after the retry budget is returned as-is so the
//! dispatcher can decode the provider's error body.

use super::hooks::BeforeRequestHook;
use super::rate_limit::RateLimiter;
use crate::config::{ClientConfig, RetryConfig};
use crate::error::{ApiError, Error, Result, LINODE_BUSY_REASON};
use crate::types::Method;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Certificate, Client};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

// ============================================================================
// Request / Response
// ============================================================================

/// A request relative to the API root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Endpoint path (`account/events`) or an absolute URL
    pub path: String,
    /// Query parameters, in insertion order
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: Vec<(String, String)>,
    /// Serialized body; `None` sends no body at all
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Create a request for the given method and endpoint
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set a query parameter, replacing any previous value
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_query(key, value);
        self
    }

    /// Set a query parameter in place, replacing any previous value
    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.query.retain(|(k, _)| *k != key);
        self.query.push((key, value.into()));
    }

    /// Add a header, replacing any previous value (case-insensitive)
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
        self.headers.push((key, value.into()));
        self
    }

    /// Attach a body
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Look up a query parameter
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a header (case-insensitive)
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response returned by a transport
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response without headers
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Create a response with a JSON body
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// True for status codes the provider uses to report failures
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Look up a header value as text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

// ============================================================================
// Transport trait
// ============================================================================

/// Performs one HTTP exchange.
///
/// Implementations return `Err` only for failures that happened before a
/// response was received (connection, TLS, timeout). Any status code is a
/// successful exchange.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send a request and return the raw response
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

// ============================================================================
// Reqwest transport
// ============================================================================

/// Production transport over reqwest with retry and rate limiting
pub struct ReqwestTransport {
    client: Client,
    root: Url,
    token: Option<String>,
    default_headers: Vec<(String, String)>,
    retry: RetryConfig,
    timeout: Duration,
    rate_limiter: Option<RateLimiter>,
    before_request: Vec<BeforeRequestHook>,
    debug: bool,
}

impl ReqwestTransport {
    /// Build a transport from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent);

        if let Some(path) = &config.root_ca_path {
            let pem = std::fs::read(path).map_err(|e| {
                Error::config(format!(
                    "failed to read root certificate {}: {e}",
                    path.display()
                ))
            })?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
            debug!("Added root certificate from {}", path.display());
        }

        let mut default_headers: Vec<(String, String)> = config
            .default_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        default_headers.sort();

        Ok(Self {
            client: builder.build()?,
            root: config.api_root()?,
            token: config.token.clone(),
            default_headers,
            retry: config.retry.clone(),
            timeout: config.timeout,
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
            before_request: config.before_request.clone(),
            debug: config.debug,
        })
    }

    /// Root URL every relative path is resolved against
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Build full URL from an endpoint path
    pub fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        Ok(self.root.join(path.trim_start_matches('/'))?)
    }

    fn build_request(&self, url: &Url, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut req = self.client.request(request.method.into(), url.clone());

        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        for (key, value) in &self.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        req
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, original: HttpRequest) -> Result<HttpResponse> {
        let max_retries = self.retry.max_retries;
        let mut attempt = 0;

        loop {
            let mut request = original.clone();
            for hook in &self.before_request {
                hook.apply(&mut request)?;
            }
            let url = self.build_url(&request.path)?;

            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            debug!("{} {}", request.method, url);

            match self.build_request(&url, &request).send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let headers = resp.headers().clone();
                    let body = resp.bytes().await?;
                    let response = HttpResponse {
                        status,
                        headers,
                        body,
                    };

                    if attempt < max_retries {
                        if let Some(delay) = retry_delay(&self.retry, &response, attempt) {
                            warn!(
                                "Request failed with {}, attempt {}/{}, retrying in {:?}",
                                status,
                                attempt + 1,
                                max_retries + 1,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                            continue;
                        }
                    }

                    if self.debug {
                        debug!(
                            "{} {} -> {}: {}",
                            request.method,
                            url,
                            status,
                            truncate_for_log(&response.body)
                        );
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if (e.is_timeout() || e.is_connect()) && attempt < max_retries {
                        let delay = self.retry.backoff(attempt);
                        warn!(
                            "Transport error ({e}), attempt {}/{}, retrying in {:?}",
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if e.is_timeout() {
                        return Err(Error::Timeout {
                            timeout_ms: self.timeout.as_millis() as u64,
                        });
                    }

                    return Err(Error::Http(e));
                }
            }
        }
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("root", &self.root.as_str())
            .field("has_token", &self.token.is_some())
            .field("retry", &self.retry)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .field("before_request", &self.before_request.len())
            .finish_non_exhaustive()
    }
}

/// Decide whether a response should be retried and after how long.
///
/// Retries 429 (honouring `Retry-After`), 503, 408, 400 responses whose
/// reason says the instance is busy with another job, and anything matched
/// by the configured retry conditions. A configured retry-after function
/// picks the delay when it returns one. Delays never exceed `max_backoff`.
pub fn retry_delay(retry: &RetryConfig, response: &HttpResponse, attempt: u32) -> Option<Duration> {
    if !is_retryable(retry, response) {
        return None;
    }

    if let Some(delay) = retry
        .retry_after
        .as_ref()
        .and_then(|after| after.delay(response, attempt))
    {
        return Some(delay.min(retry.max_backoff));
    }

    let delay = match response.status {
        429 => response
            .header(RETRY_AFTER.as_str())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or_else(|| retry.backoff(attempt), Duration::from_secs),
        _ => retry.backoff(attempt),
    };
    Some(delay.min(retry.max_backoff))
}

fn is_retryable(retry: &RetryConfig, response: &HttpResponse) -> bool {
    let built_in = match response.status {
        408 | 429 | 503 => true,
        400 => ApiError::from_response(400, &response.body).has_reason(LINODE_BUSY_REASON),
        _ => false,
    };
    built_in
        || retry
            .retry_conditions
            .iter()
            .any(|condition| condition.matches(response))
}

fn truncate_for_log(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &text[..end], text.len())
    } else {
        text.into_owned()
    }
}
