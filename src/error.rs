//! Error types for the Linode API client
//!
//! Every public API returns `Result<T, Error>` where Error is defined here.
//! Transport failures pass through untouched, provider failures become
//! [`Error::Api`], and the event waiter has its own two terminal variants.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The main error type for the client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// Invalid or inconsistent configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
    },

    /// A required configuration value is absent
    #[error("Missing required config field: {field}")]
    MissingConfigField {
        /// Name of the field
        field: String,
    },

    /// A configuration value could not be used
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue {
        /// Name of the field
        field: String,
        /// Why the value was rejected
        message: String,
    },

    /// Profile file is not valid YAML
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    /// Connection, TLS or protocol failure before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The request exceeded the configured timeout
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// Base URL or endpoint could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The cancellation token fired
    #[error("Request cancelled")]
    Cancelled,

    // ============================================================================
    // Body Errors
    // ============================================================================
    /// Request options could not be serialized
    #[error("Failed to encode request body: {message}")]
    Encode {
        /// Serializer message
        message: String,
    },

    /// Response body did not match the expected type
    #[error("Failed to decode response: {message}")]
    Decode {
        /// Deserializer message
        message: String,
    },

    // ============================================================================
    // Provider Errors
    // ============================================================================
    /// The provider answered with an error status
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Unknown resource name
    #[error("Could not find resource named '{name}'")]
    ResourceNotFound {
        /// Requested name
        name: String,
    },

    /// Endpoint template placeholder without a value
    #[error("Undefined variable in endpoint template: {variable}")]
    UndefinedVariable {
        /// Placeholder name
        variable: String,
    },

    // ============================================================================
    // Waiter Errors
    // ============================================================================
    /// The awaited action finished with a failed status
    #[error("{entity_type} {entity_id} action {action} failed")]
    ActionFailed {
        /// Entity kind
        entity_type: String,
        /// Entity id
        entity_id: String,
        /// Awaited action
        action: String,
    },

    /// The awaited action did not finish in time
    #[error("Did not find '{action}' status of {entity_type} {entity_id} within {timeout:?}")]
    WaitTimeout {
        /// Entity kind
        entity_type: String,
        /// Entity id
        entity_id: String,
        /// Awaited action
        action: String,
        /// How long the waiter polled
        timeout: Duration,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    /// File system failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Profile file does not exist
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was looked up
        path: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// Anything else
    #[error("{0}")]
    Other(String),

    /// Error raised by caller code, such as a hook
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an encode error
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a resource-not-found error
    pub fn resource_not_found(name: impl Into<String>) -> Self {
        Self::ResourceNotFound { name: name.into() }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// HTTP status code carried by a provider error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the provider answered 404
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Timeout { .. } => true,
            Error::Api(api) => api.is_retryable(),
            _ => false,
        }
    }
}

/// A single reason reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorReason {
    /// Request field the reason refers to, when the provider names one
    #[serde(default)]
    pub field: Option<String>,
    /// Human-readable reason
    pub reason: String,
}

impl fmt::Display for ApiErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field.as_deref() {
            Some(field) if !field.is_empty() => write!(f, "[{field}] {}", self.reason),
            _ => f.write_str(&self.reason),
        }
    }
}

/// Wire shape of a provider error body
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    errors: Vec<ApiErrorReason>,
}

/// Provider-reported failure (status >= 400)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Reasons decoded from the error body
    pub reasons: Vec<ApiErrorReason>,
}

impl ApiError {
    /// Build an API error from a status code and raw response body.
    ///
    /// Bodies that do not follow `{"errors": [...]}` are kept verbatim
    /// (trimmed) as the only reason; empty bodies fall back to the
    /// canonical status text.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let reasons = match serde_json::from_slice::<ApiErrorBody>(body) {
            Ok(parsed) if !parsed.errors.is_empty() => parsed.errors,
            _ => vec![ApiErrorReason {
                field: None,
                reason: fallback_reason(status, body),
            }],
        };

        Self { status, reasons }
    }

    /// Joined reason text without the status prefix
    pub fn message(&self) -> String {
        self.reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// True when any reason contains the given text
    pub fn has_reason(&self, needle: &str) -> bool {
        self.reasons.iter().any(|r| r.reason.contains(needle))
    }

    /// Check if the provider asked us to come back later
    pub fn is_retryable(&self) -> bool {
        is_retryable_status(self.status)
            || (self.status == 400 && self.has_reason(LINODE_BUSY_REASON))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:03}] {}", self.status, self.message())
    }
}

impl std::error::Error for ApiError {}

/// Reason text the provider uses when an instance is locked by another job
pub const LINODE_BUSY_REASON: &str = "Linode busy.";

fn fallback_reason(status: u16, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        text.to_string()
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 503)
}

/// Result type alias for the client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
