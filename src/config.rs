//! Client configuration
//!
//! [`ClientConfig`] is built once and handed to the client at construction;
//! nothing in the crate reads process-wide mutable state afterwards. It can
//! be filled from the environment (`LINODE_TOKEN`, `LINODE_URL`, ...) and
//! from a YAML profile file.

use crate::error::{Error, Result};
use crate::http::{
    BeforeRequestHook, HttpRequest, HttpResponse, RateLimiterConfig, RetryAfter, RetryCondition,
};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

// ============================================================================
// Defaults and environment variables
// ============================================================================

/// Default API root
pub const DEFAULT_API_URL: &str = "https://api.linode.com";
/// Default API version path segment
pub const DEFAULT_API_VERSION: &str = "v4";
/// Default delay between event polls and retries
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(3);
/// Upper bound on a single retry wait
pub const DEFAULT_RETRY_MAX_WAIT: Duration = Duration::from_secs(30);
/// Lifetime of cached listing responses
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);
/// Profile used when `LINODE_PROFILE` is not set
pub const DEFAULT_PROFILE: &str = "default";

/// API token
pub const ENV_TOKEN: &str = "LINODE_TOKEN";
/// Alternate API URL
pub const ENV_URL: &str = "LINODE_URL";
/// Alternate API version
pub const ENV_API_VERSION: &str = "LINODE_API_VERSION";
/// Path to a PEM root certificate to trust
pub const ENV_CA: &str = "LINODE_CA";
/// Enables debug logging of requests
pub const ENV_DEBUG: &str = "LINODE_DEBUG";
/// Path to a YAML profile file
pub const ENV_CONFIG: &str = "LINODE_CONFIG";
/// Profile to select from the profile file
pub const ENV_PROFILE: &str = "LINODE_PROFILE";

// ============================================================================
// Retry configuration
// ============================================================================

/// Retry policy applied by the HTTP transport
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Conditions checked after the built-in 429/408/503/busy rules
    pub retry_conditions: Vec<RetryCondition>,
    /// Overrides the delay before a retry
    pub retry_after: Option<RetryAfter>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: DEFAULT_POLL_DELAY,
            max_backoff: DEFAULT_RETRY_MAX_WAIT,
            backoff_type: BackoffType::Constant,
            retry_conditions: Vec::new(),
            retry_after: None,
        }
    }
}

impl RetryConfig {
    /// A policy that never retries
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Also retry responses matching `condition`
    #[must_use]
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&HttpResponse) -> bool + Send + Sync + 'static,
    {
        self.retry_conditions.push(RetryCondition::new(condition));
        self
    }

    /// Compute retry delays with `delay`; returning `None` keeps the default
    #[must_use]
    pub fn with_retry_after<F>(mut self, delay: F) -> Self
    where
        F: Fn(&HttpResponse, u32) -> Option<Duration> + Send + Sync + 'static,
    {
        self.retry_after = Some(RetryAfter::new(delay));
        self
    }

    /// Calculate backoff delay for a given attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }
}

// ============================================================================
// Client configuration
// ============================================================================

/// Immutable configuration for a [`Client`](crate::Client)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host of the API (`https://api.linode.com`)
    pub base_url: String,
    /// API version path segment (`v4`, `v4beta`)
    pub api_version: String,
    /// Personal access token sent as a bearer token
    pub token: Option<String>,
    /// User agent string
    pub user_agent: String,
    /// Extra PEM root certificate to trust
    pub root_ca_path: Option<PathBuf>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Delay between event polls
    pub poll_delay: Duration,
    /// Retry policy for the transport
    pub retry: RetryConfig,
    /// Client-side rate limit
    pub rate_limit: Option<RateLimiterConfig>,
    /// Whether cached listing endpoints use the response cache
    pub use_cache: bool,
    /// Lifetime of cached listing responses
    pub cache_ttl: Duration,
    /// Log request and response details at debug level
    pub debug: bool,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// Hooks run in order against every attempt before it is sent
    pub before_request: Vec<BeforeRequestHook>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: None,
            user_agent: format!("linode-api/{}", env!("CARGO_PKG_VERSION")),
            root_ca_path: None,
            timeout: Duration::from_secs(30),
            poll_delay: DEFAULT_POLL_DELAY,
            retry: RetryConfig::default(),
            rate_limit: None,
            use_cache: true,
            cache_ttl: DEFAULT_CACHE_TTL,
            debug: false,
            default_headers: HashMap::new(),
            before_request: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// A non-empty `LINODE_TOKEN` wins; otherwise the token comes from the
    /// selected profile of the `LINODE_CONFIG` file. Fails when neither
    /// yields a token.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_URL).filter(|v| !v.is_empty()) {
            config.base_url = url;
        }
        if let Some(version) = lookup(ENV_API_VERSION).filter(|v| !v.is_empty()) {
            config.api_version = version;
        }
        if let Some(ca) = lookup(ENV_CA).filter(|v| !v.is_empty()) {
            config.root_ca_path = Some(PathBuf::from(ca));
        }
        if let Some(debug) = lookup(ENV_DEBUG) {
            config.debug = parse_bool(&debug)
                .ok_or_else(|| Error::invalid_value(ENV_DEBUG, "expected 0, 1, true or false"))?;
        }

        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            config.token = Some(token);
            return Ok(config);
        }

        let Some(path) = lookup(ENV_CONFIG).filter(|v| !v.is_empty()) else {
            return Err(Error::config(format!(
                "no token found: set {ENV_TOKEN} or point {ENV_CONFIG} at a profile file"
            )));
        };

        let profile_name = lookup(ENV_PROFILE).unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        let profiles = load_profiles(&path)?;
        let profile = profiles.get(&profile_name).ok_or_else(|| {
            Error::config(format!("profile '{profile_name}' not found in {path}"))
        })?;
        config.apply_profile(profile);

        if config.token.is_none() {
            return Err(Error::missing_field(format!("{profile_name}.token")));
        }

        Ok(config)
    }

    /// Overlay the values set in a profile
    pub fn apply_profile(&mut self, profile: &ConfigProfile) {
        if let Some(token) = &profile.token {
            self.token = Some(token.clone());
        }
        if let Some(url) = &profile.api_url {
            self.base_url = url.clone();
        }
        if let Some(version) = &profile.api_version {
            self.api_version = version.clone();
        }
    }

    /// Root URL every endpoint is resolved against, with a trailing slash
    pub fn api_root(&self) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let version = self.api_version.trim_matches('/');
        let root = if version.is_empty() {
            format!("{base}/")
        } else {
            format!("{base}/{version}/")
        };
        Ok(Url::parse(&root)?)
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" => Some(true),
        "0" | "false" | "f" | "no" | "" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// One named profile in a profile file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigProfile {
    /// API token
    #[serde(default)]
    pub token: Option<String>,
    /// API URL override
    #[serde(default)]
    pub api_url: Option<String>,
    /// API version override
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Load every profile from a YAML file keyed by profile name
pub fn load_profiles(path: impl AsRef<Path>) -> Result<HashMap<String, ConfigProfile>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;
    parse_profiles(&contents)
}

/// Parse profiles from YAML text
pub fn parse_profiles(contents: &str) -> Result<HashMap<String, ConfigProfile>> {
    Ok(serde_yaml::from_str(contents)?)
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ClientConfig`]
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the API base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the API version
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Set the API token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Trust an additional PEM root certificate
    pub fn root_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_ca_path = Some(path.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the delay between event polls
    pub fn poll_delay(mut self, delay: Duration) -> Self {
        self.config.poll_delay = delay;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Retry responses matching `condition` in addition to the built-in rules
    pub fn retry_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&HttpResponse) -> bool + Send + Sync + 'static,
    {
        self.config
            .retry
            .retry_conditions
            .push(RetryCondition::new(condition));
        self
    }

    /// Compute retry delays with a custom function
    pub fn retry_after<F>(mut self, delay: F) -> Self
    where
        F: Fn(&HttpResponse, u32) -> Option<Duration> + Send + Sync + 'static,
    {
        self.config.retry.retry_after = Some(RetryAfter::new(delay));
        self
    }

    /// Run `hook` against every attempt before it is sent
    pub fn on_before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Result<()> + Send + Sync + 'static,
    {
        self.config.before_request.push(BeforeRequestHook::new(hook));
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Enable or disable the response cache
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.config.use_cache = enabled;
        self
    }

    /// Set the response cache lifetime
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Toggle request debug logging
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
