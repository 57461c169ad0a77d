//! Common types used throughout the client
//!
//! Small enums shared by the transport, the
//! dispatcher and the configuration layer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method understood by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read
    #[default]
    GET,
    /// Create or trigger an action
    POST,
    /// Update
    PUT,
    /// Remove
    DELETE,
}

impl Method {
    /// Upper-case method name
    pub fn as_str(self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

// ============================================================================
// Retry Types
// ============================================================================

/// Backoff strategy for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    #[default]
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    Exponential,
}
