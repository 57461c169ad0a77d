//! Tests for the HTTP transport module

use super::*;
use crate::config::{ClientConfig, RetryConfig};
use crate::http::RateLimiterConfig;
use crate::error::Error;
use crate::types::{BackoffType, Method};
use reqwest::header::HeaderValue;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests that carry no body at all
struct EmptyBody;

impl Match for EmptyBody {
    fn matches(&self, request: &Request) -> bool {
        request.body.is_empty()
    }
}

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(50),
        backoff_type: BackoffType::Constant,
        ..RetryConfig::default()
    }
}

fn transport_for(server: &MockServer, retries: u32) -> ReqwestTransport {
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .token("test-token")
        .user_agent("linode-api-tests/1.0")
        .retry(fast_retry(retries))
        .build();
    ReqwestTransport::new(&config).unwrap()
}

// ============================================================================
// Request / Response helpers
// ============================================================================

#[test]
fn test_request_builder_replaces_values() {
    let request = HttpRequest::new(Method::GET, "linode/instances")
        .query("page", "1")
        .query("page", "2")
        .header("X-Filter", "{}")
        .header("x-filter", r#"{"label":"web"}"#);

    assert_eq!(request.query_param("page"), Some("2"));
    assert_eq!(request.query.len(), 1);
    assert_eq!(request.header_value("X-FILTER"), Some(r#"{"label":"web"}"#));
    assert_eq!(request.headers.len(), 1);
    assert!(request.body.is_none());
}

#[test]
fn test_response_helpers() {
    let mut response = HttpResponse::json(429, &serde_json::json!({"errors": []}));
    response
        .headers
        .insert("retry-after", HeaderValue::from_static("2"));

    assert!(response.is_error());
    assert_eq!(response.header("Retry-After"), Some("2"));
    assert!(!HttpResponse::new(204, "").is_error());
}

#[test]
fn test_build_url() {
    let config = ClientConfig::builder()
        .base_url("https://api.example.com")
        .build();
    let transport = ReqwestTransport::new(&config).unwrap();

    assert_eq!(
        transport.build_url("/account/events").unwrap().as_str(),
        "https://api.example.com/v4/account/events"
    );
    assert_eq!(
        transport
            .build_url("https://other.example.com/v4/regions")
            .unwrap()
            .as_str(),
        "https://other.example.com/v4/regions"
    );
    assert!(!transport.has_rate_limiter());
}

// ============================================================================
// Retry decisions
// ============================================================================

#[test]
fn test_retry_delay_decisions() {
    let retry = RetryConfig {
        max_retries: 3,
        initial_backoff: Duration::from_secs(3),
        max_backoff: Duration::from_secs(30),
        backoff_type: BackoffType::Constant,
        ..RetryConfig::default()
    };

    let mut throttled = HttpResponse::new(429, "");
    throttled
        .headers
        .insert("retry-after", HeaderValue::from_static("7"));
    assert_eq!(
        retry_delay(&retry, &throttled, 0),
        Some(Duration::from_secs(7))
    );

    throttled
        .headers
        .insert("retry-after", HeaderValue::from_static("3600"));
    assert_eq!(
        retry_delay(&retry, &throttled, 0),
        Some(Duration::from_secs(30))
    );

    assert_eq!(
        retry_delay(&retry, &HttpResponse::new(429, ""), 0),
        Some(Duration::from_secs(3))
    );
    assert!(retry_delay(&retry, &HttpResponse::new(503, ""), 1).is_some());
    assert!(retry_delay(&retry, &HttpResponse::new(408, ""), 1).is_some());

    let busy = HttpResponse::new(400, r#"{"errors": [{"reason": "Linode busy."}]}"#);
    assert!(retry_delay(&retry, &busy, 0).is_some());

    let invalid = HttpResponse::new(400, r#"{"errors": [{"reason": "Label is invalid"}]}"#);
    assert!(retry_delay(&retry, &invalid, 0).is_none());
    assert!(retry_delay(&retry, &HttpResponse::new(500, ""), 0).is_none());
    assert!(retry_delay(&retry, &HttpResponse::new(200, "{}"), 0).is_none());
}

#[test]
fn test_retry_conditions_extend_built_in_rules() {
    let retry = fast_retry(3).with_condition(|response| response.status == 500);

    assert!(retry_delay(&retry, &HttpResponse::new(500, ""), 0).is_some());
    assert!(retry_delay(&retry, &HttpResponse::new(503, ""), 0).is_some());
    assert!(retry_delay(&retry, &HttpResponse::new(502, ""), 0).is_none());
}

#[test]
fn test_retry_after_overrides_delay() {
    let retry = fast_retry(3)
        .with_condition(|response| response.status == 500)
        .with_retry_after(|response, attempt| {
            (response.status == 500).then(|| Duration::from_millis(10 * u64::from(attempt + 1)))
        });

    assert_eq!(
        retry_delay(&retry, &HttpResponse::new(500, ""), 2),
        Some(Duration::from_millis(30))
    );
    // Capped at max_backoff
    assert_eq!(
        retry_delay(&retry, &HttpResponse::new(500, ""), 9),
        Some(Duration::from_millis(50))
    );
    // None falls back to the default backoff
    assert_eq!(
        retry_delay(&retry, &HttpResponse::new(503, ""), 0),
        Some(Duration::from_millis(5))
    );
    // The callback never makes a response retryable on its own
    assert!(retry_delay(&retry, &HttpResponse::new(404, ""), 0).is_none());
}

// ============================================================================
// Reqwest transport against a mock server
// ============================================================================

#[tokio::test]
async fn test_transport_sends_auth_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/account/events"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("User-Agent", "linode-api-tests/1.0"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server, 0);
    let response = transport
        .send(HttpRequest::new(Method::GET, "account/events").query("page", "3"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(&response.body[..], br#"{"ok":true}"#);
}

#[tokio::test]
async fn test_transport_omits_missing_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v4/linode/instances/123/boot"))
        .and(EmptyBody)
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server, 0);
    let response = transport
        .send(HttpRequest::new(Method::POST, "linode/instances/123/boot"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_transport_retries_on_429() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/regions"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/regions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server, 2);
    let response = transport
        .send(HttpRequest::new(Method::GET, "regions"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn test_transport_retries_when_linode_busy() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v4/linode/instances/1/reboot"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "errors": [{"reason": "Linode busy."}]
        })))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v4/linode/instances/1/reboot"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server, 3);
    let response = transport
        .send(HttpRequest::new(Method::POST, "linode/instances/1/reboot"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_transport_returns_last_response_when_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/regions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server, 2);
    let response = transport
        .send(HttpRequest::new(Method::GET, "regions"))
        .await
        .unwrap();

    assert_eq!(response.status, 503);
}

#[tokio::test]
async fn test_transport_does_not_retry_client_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/linode/instances/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "errors": [{"reason": "Not found"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server, 3);
    let response = transport
        .send(HttpRequest::new(Method::GET, "linode/instances/999"))
        .await
        .unwrap();

    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_transport_retries_custom_condition() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/regions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/regions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .base_url(mock_server.uri())
        .retry(fast_retry(2))
        .retry_condition(|response| response.status == 500)
        .build();
    let transport = ReqwestTransport::new(&config).unwrap();

    let response = transport
        .send(HttpRequest::new(Method::GET, "regions"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_before_request_hook_adds_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/profile"))
        .and(header("X-Request-Source", "nightly-sync"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .base_url(mock_server.uri())
        .retry(fast_retry(0))
        .on_before_request(|request| {
            request.headers.push(("X-Request-Source".into(), "nightly-sync".into()));
            Ok(())
        })
        .build();
    let transport = ReqwestTransport::new(&config).unwrap();

    let response = transport
        .send(HttpRequest::new(Method::GET, "profile"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_before_request_hook_runs_on_every_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/regions"))
        .and(header("X-Attempt", "1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/regions"))
        .and(header("X-Attempt", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let attempts = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter = attempts.clone();
    let config = ClientConfig::builder()
        .base_url(mock_server.uri())
        .retry(fast_retry(2))
        .on_before_request(move |request| {
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            request.headers.push(("X-Attempt".into(), n.to_string()));
            Ok(())
        })
        .build();
    let transport = ReqwestTransport::new(&config).unwrap();

    let response = transport
        .send(HttpRequest::new(Method::GET, "regions"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_before_request_hook_error_aborts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .base_url(mock_server.uri())
        .on_before_request(|_| Err(Error::config("refusing to send")))
        .build();
    let transport = ReqwestTransport::new(&config).unwrap();

    let err = transport
        .send(HttpRequest::new(Method::GET, "regions"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_transport_enforces_per_minute_quota() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/regions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .base_url(mock_server.uri())
        .retry(fast_retry(0))
        .rate_limit(RateLimiterConfig::new(1, 2))
        .build();
    let transport = ReqwestTransport::new(&config).unwrap();
    assert!(transport.has_rate_limiter());

    for _ in 0..2 {
        let response = transport
            .send(HttpRequest::new(Method::GET, "regions"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    // The burst is spent and the next token is a minute away
    let third = tokio::time::timeout(
        Duration::from_millis(100),
        transport.send(HttpRequest::new(Method::GET, "regions")),
    )
    .await;
    assert!(third.is_err());
}

#[tokio::test]
async fn test_transport_connection_error_is_untranslated() {
    let config = ClientConfig::builder()
        .base_url("http://127.0.0.1:1")
        .retry(fast_retry(0))
        .build();
    let transport = ReqwestTransport::new(&config).unwrap();

    let err = transport
        .send(HttpRequest::new(Method::GET, "regions"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(_)));
}

// ============================================================================
// Mock transport
// ============================================================================

#[tokio::test]
async fn test_mock_transport_routes_and_records() {
    let transport = MockTransport::new().on_json(
        Method::GET,
        "regions",
        200,
        serde_json::json!({"data": []}),
    );

    let ok = transport
        .send(HttpRequest::new(Method::GET, "/regions"))
        .await
        .unwrap();
    assert_eq!(ok.status, 200);

    let missing = transport
        .send(HttpRequest::new(Method::DELETE, "regions"))
        .await
        .unwrap();
    assert_eq!(missing.status, 404);

    let requests = transport.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, Method::DELETE);
}
