//! Tests for the request dispatcher

use super::*;
use crate::config::RetryConfig;
use crate::error::Error;
use crate::http::{HttpResponse, MockTransport};
use crate::resource::names;
use crate::types::Method;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use test_case::test_case;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize, PartialEq)]
struct Instance {
    id: u64,
    label: String,
}

#[derive(Debug, Serialize)]
struct RebootOptions {
    config_id: u64,
}

fn test_config() -> ClientConfig {
    ClientConfig::builder()
        .base_url("https://api.example.com")
        .token("test-token")
        .retry(RetryConfig::disabled())
        .build()
}

fn client_with(transport: MockTransport) -> (Client, Arc<MockTransport>) {
    let transport = Arc::new(transport);
    (
        Client::with_transport(test_config(), transport.clone()),
        transport,
    )
}

// ============================================================================
// Success paths
// ============================================================================

#[tokio::test]
async fn test_get_decodes_body() {
    let (client, transport) = client_with(MockTransport::new().on_json(
        Method::GET,
        "linode/instances/123",
        200,
        json!({"id": 123, "label": "web-1", "status": "running"}),
    ));

    let instance: Instance = client
        .get("linode/instances/123", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        instance,
        Instance {
            id: 123,
            label: "web-1".to_string()
        }
    );

    let requests = transport.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header_value("accept"), Some("application/json"));
    assert_eq!(requests[0].header_value("content-type"), Some("application/json"));
    assert!(requests[0].body.is_none());
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let (client, transport) = client_with(MockTransport::new().on_json(
        Method::POST,
        "linode/instances/123/reboot",
        200,
        json!({}),
    ));

    let _: Value = client
        .post(
            "linode/instances/123/reboot",
            Some(&RebootOptions { config_id: 7 }),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let requests = transport.requests().await;
    let body: Value = serde_json::from_slice(requests[0].body.as_ref().unwrap()).unwrap();
    assert_eq!(body, json!({"config_id": 7}));
}

#[test_case(None ; "no options")]
#[test_case(Some(Value::Null) ; "options serializing to null")]
#[tokio::test]
async fn test_post_without_options_sends_no_body(options: Option<Value>) {
    let (client, transport) = client_with(MockTransport::new().on_json(
        Method::POST,
        "account/events/42/read",
        200,
        json!({}),
    ));

    let _: Value = client
        .post("account/events/42/read", options.as_ref(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(transport.requests().await[0].body.is_none());
}

#[tokio::test]
async fn test_put_sends_body_and_decodes() {
    let (client, transport) = client_with(MockTransport::new().on(
        Method::PUT,
        "linode/instances/123",
        |request| {
            let sent: Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
            Ok(HttpResponse::json(
                200,
                &json!({"id": 123, "label": sent["label"]}),
            ))
        },
    ));

    let updated: Instance = client
        .put(
            "linode/instances/123",
            Some(&json!({"label": "renamed"})),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(updated.label, "renamed");
    assert_eq!(transport.request_count().await, 1);
}

#[tokio::test]
async fn test_delete_ignores_body() {
    let (client, transport) = client_with(MockTransport::new().on(
        Method::DELETE,
        "linode/instances/123",
        |_| Ok(HttpResponse::new(200, "{}")),
    ));

    client
        .delete("linode/instances/123", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(transport.requests().await[0].method, Method::DELETE);
}

#[tokio::test]
async fn test_empty_body_decodes_as_null() {
    let (client, _) = client_with(MockTransport::new().on(
        Method::POST,
        "account/events/42/seen",
        |_| Ok(HttpResponse::new(200, "")),
    ));

    let value: Option<Instance> = client
        .post::<_, Value>("account/events/42/seen", None, &CancellationToken::new())
        .await
        .unwrap();
    assert!(value.is_none());
}

// ============================================================================
// Failure paths
// ============================================================================

#[tokio::test]
async fn test_api_error_mapping() {
    let (client, _) = client_with(MockTransport::new().on_json(
        Method::POST,
        "linode/instances",
        400,
        json!({"errors": [
            {"field": "region", "reason": "region is required"},
            {"reason": "Invalid request"}
        ]}),
    ));

    let err = client
        .post::<Value, _>(
            "linode/instances",
            Some(&json!({"label": "web"})),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.to_string(),
        "[400] [region] region is required; Invalid request"
    );
}

#[tokio::test]
async fn test_malformed_error_body_is_deterministic() {
    let (client, _) = client_with(MockTransport::new().on(
        Method::GET,
        "regions",
        |_| Ok(HttpResponse::new(502, "<html>Bad Gateway</html>")),
    ));
    let cancel = CancellationToken::new();

    let first = client.get::<Value>("regions", &cancel).await.unwrap_err();
    let second = client.get::<Value>("regions", &cancel).await.unwrap_err();

    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.to_string(), "[502] <html>Bad Gateway</html>");
}

#[tokio::test]
async fn test_unknown_endpoint_is_not_found() {
    let (client, _) = client_with(MockTransport::new());

    let err = client
        .get::<Value>("nodebalancers/1", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_decode_error() {
    let (client, _) = client_with(MockTransport::new().on_json(
        Method::GET,
        "linode/instances/123",
        200,
        json!({"id": "not-a-number"}),
    ));

    let err = client
        .get::<Instance>("linode/instances/123", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_transport_error_passes_through() {
    let (client, _) = client_with(MockTransport::new().on(
        Method::GET,
        "regions",
        |_| Err(Error::Timeout { timeout_ms: 1000 }),
    ));

    let err = client
        .get::<Value>("regions", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 1000 }));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_send() {
    let (client, transport) = client_with(MockTransport::new().on_json(
        Method::GET,
        "regions",
        200,
        json!({"data": []}),
    ));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.get::<Value>("regions", &cancel).await.unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(transport.request_count().await, 0);
}

#[tokio::test]
async fn test_cancelled_in_flight() {
    let (client, _) = client_with(
        MockTransport::new()
            .on_json(Method::GET, "regions", 200, json!({"data": []}))
            .with_latency(Duration::from_secs(30)),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client.get::<Value>("regions", &cancel),
    )
    .await
    .expect("cancellation should end the call");

    assert!(matches!(result, Err(Error::Cancelled)));
}

// ============================================================================
// Resources
// ============================================================================

#[test]
fn test_resource_lookup() {
    let (client, _) = client_with(MockTransport::new());

    let disks = client.resource(names::INSTANCE_DISKS).unwrap();
    assert_eq!(
        disks.endpoint_with_id(123).unwrap(),
        "linode/instances/123/disks"
    );

    let err = client.resource("not-a-resource").unwrap_err();
    assert_eq!(err.to_string(), "Could not find resource named 'not-a-resource'");
}

#[test]
fn test_client_debug_hides_token() {
    let (client, _) = client_with(MockTransport::new());
    let debug = format!("{client:?}");
    assert!(debug.contains("api.example.com"));
    assert!(!debug.contains("test-token"));
}
