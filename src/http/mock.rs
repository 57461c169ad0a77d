//! In-memory transport for tests
//!
//! Routes are matched on method and path; every request is recorded so
//! tests can assert on exactly what was sent.

use super::transport::{HttpRequest, HttpResponse, Transport};
use crate::error::Result;
use crate::types::Method;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync>;

struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

/// Scriptable transport that never touches the network
#[derive(Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    latency: Option<Duration>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Create a transport with no routes; unmatched requests get a 404
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for `method path` with a handler
    #[must_use]
    pub fn on<F>(mut self, method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.into(),
            handler: Box::new(handler),
        });
        self
    }

    /// Answer requests for `method path` with a fixed JSON body
    #[must_use]
    pub fn on_json(self, method: Method, path: impl Into<String>, status: u16, body: Value) -> Self {
        self.on(method, path, move |_| Ok(HttpResponse::json(status, &body)))
    }

    /// Delay every response
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// All requests received so far, in order
    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of requests received so far
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().await.push(request.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let path = request.path.trim_start_matches('/');
        match self
            .routes
            .iter()
            .find(|r| r.method == request.method && r.path.trim_start_matches('/') == path)
        {
            Some(route) => (route.handler)(&request),
            None => Ok(HttpResponse::json(
                404,
                &json!({"errors": [{"reason": "Not found"}]}),
            )),
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routes: Vec<String> = self
            .routes
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect();
        f.debug_struct("MockTransport")
            .field("routes", &routes)
            .finish_non_exhaustive()
    }
}
