//! Tests for the metadata service client

use super::*;
use crate::http::{HttpResponse, MockTransport};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::net::IpAddr;
use test_case::test_case;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn network_body() -> serde_json::Value {
    json!({
        "vlan-id": 0,
        "ipv4": {
            "public": ["172.105.10.20/32"],
            "private": ["192.168.128.5/17"],
            "elastic": []
        },
        "ipv6": {
            "ranges": ["2600:3c03:e000:123::/64"],
            "link-local": "fe80::f03c:93ff:fe4a:1b2c/64",
            "elastic-ranges": []
        }
    })
}

fn token_transport() -> MockTransport {
    MockTransport::new().on(Method::PUT, "token", |_| {
        Ok(HttpResponse::new(200, "meta-token-abc"))
    })
}

async fn client_over(transport: Arc<MockTransport>) -> MetadataClient {
    MetadataClient::with_transport(
        MetadataClientOptions::default(),
        transport,
        &CancellationToken::new(),
    )
    .await
    .unwrap()
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_default_root() {
    let options = MetadataClientOptions::default();
    assert_eq!(options.root_url().unwrap(), "http://169.254.169.254/v1");
}

#[test_case(Some("https://meta.example.com"), None, None, "https://meta.example.com/v1" ; "base url")]
#[test_case(Some("http://localhost:8080/prefix/"), Some("v2"), None, "http://localhost:8080/prefix/v2" ; "base url with port and path")]
#[test_case(None, Some("/v1beta/"), None, "http://169.254.169.254/v1beta" ; "version only")]
#[test_case(Some("http://localhost:8080"), None, Some("https"), "https://localhost:8080/v1" ; "scheme after base url")]
fn test_root_overrides(
    base_url: Option<&str>,
    version: Option<&str>,
    scheme: Option<&str>,
    expected: &str,
) {
    let options = MetadataClientOptions {
        base_url: base_url.map(String::from),
        version: version.map(String::from),
        scheme: scheme.map(String::from),
        ..MetadataClientOptions::default()
    };
    assert_eq!(options.root_url().unwrap(), expected);
}

#[test]
fn test_debug_from_lookup() {
    let options = MetadataClientOptions::from_lookup(|key| {
        (key == ENV_DEBUG).then(|| "true".to_string())
    })
    .unwrap();
    assert!(options.debug);

    let err = MetadataClientOptions::from_lookup(|_| Some("sometimes".to_string())).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}

// ============================================================================
// Token handling
// ============================================================================

#[tokio::test]
async fn test_token_generated_on_construction() {
    let transport = Arc::new(
        token_transport().on_json(Method::GET, "network", 200, network_body()),
    );
    let client = client_over(transport.clone()).await;
    assert!(client.has_token());

    client.get_network(&CancellationToken::new()).await.unwrap();

    let requests = transport.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::PUT);
    assert_eq!(requests[0].header_value(TOKEN_EXPIRY_HEADER), Some("3600"));
    assert_eq!(requests[0].header_value(TOKEN_HEADER), None);
    assert_eq!(requests[1].header_value(TOKEN_HEADER), Some("meta-token-abc"));
}

#[tokio::test]
async fn test_token_init_can_be_disabled() {
    let transport = Arc::new(MockTransport::new());
    let options = MetadataClientOptions {
        disable_token_init: true,
        ..MetadataClientOptions::default()
    };

    let mut client =
        MetadataClient::with_transport(options, transport.clone(), &CancellationToken::new())
            .await
            .unwrap();

    assert!(!client.has_token());
    assert_eq!(transport.request_count().await, 0);

    client.use_token("supplied");
    assert!(client.has_token());
}

#[tokio::test]
async fn test_generate_token_with_custom_expiry() {
    let transport = Arc::new(token_transport());
    let client = client_over(transport.clone()).await;

    let token = client
        .generate_token(
            GenerateTokenOptions {
                expiry: Some(Duration::from_secs(60)),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(token, "meta-token-abc");
    let requests = transport.requests().await;
    assert_eq!(requests[1].header_value(TOKEN_EXPIRY_HEADER), Some("60"));
}

#[tokio::test]
async fn test_token_failure_fails_construction() {
    let transport = Arc::new(MockTransport::new().on_json(
        Method::PUT,
        "token",
        403,
        json!({"errors": [{"reason": "Metadata is not available for this instance"}]}),
    ));

    let err = MetadataClient::with_transport(
        MetadataClientOptions::default(),
        transport,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), Some(403));
}

// ============================================================================
// Endpoints
// ============================================================================

#[tokio::test]
async fn test_get_network() {
    let transport = Arc::new(
        token_transport().on_json(Method::GET, "network", 200, network_body()),
    );
    let client = client_over(transport.clone()).await;

    let network = client.get_network(&CancellationToken::new()).await.unwrap();

    assert_eq!(network.vlan_id, 0);
    assert_eq!(network.ipv4.public, vec!["172.105.10.20/32"]);
    assert_eq!(network.ipv6.link_local, "fe80::f03c:93ff:fe4a:1b2c/64");
    assert!(network.ipv6.elastic_ranges.is_empty());

    let ranges = network.ipv6.parsed_ranges().unwrap();
    assert_eq!(ranges[0].to_string(), "2600:3c03:e000:123::/64");

    let requests = transport.requests().await;
    assert_eq!(requests[1].header_value("Accept"), Some("application/json"));
}

#[tokio::test]
async fn test_get_ssh_keys_accepts_null_lists() {
    let transport = Arc::new(token_transport().on_json(
        Method::GET,
        "ssh-keys",
        200,
        json!({"users": {"root": null}}),
    ));
    let client = client_over(transport).await;

    let keys = client.get_ssh_keys(&CancellationToken::new()).await.unwrap();
    assert!(keys.users.root.is_empty());
}

#[tokio::test]
async fn test_get_user_data_is_plain_text() {
    let transport = Arc::new(token_transport().on(Method::GET, "user-data", |_| {
        Ok(HttpResponse::new(200, "I2Nsb3VkLWNvbmZpZw=="))
    }));
    let client = client_over(transport.clone()).await;

    let data = client.get_user_data(&CancellationToken::new()).await.unwrap();

    assert_eq!(data, "I2Nsb3VkLWNvbmZpZw==");
    let requests = transport.requests().await;
    assert_eq!(requests[1].header_value("Accept"), Some("text/plain"));
    assert_eq!(requests[1].header_value("Content-Type"), Some("text/plain"));
}

#[tokio::test]
async fn test_endpoint_error_becomes_api_error() {
    let transport = Arc::new(token_transport().on_json(
        Method::GET,
        "ssh-keys",
        401,
        json!({"errors": [{"reason": "Unauthorized"}]}),
    ));
    let client = client_over(transport).await;

    let err = client
        .get_ssh_keys(&CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        Error::Api(api) => {
            assert_eq!(api.status, 401);
            assert_eq!(api.to_string(), "[401] Unauthorized");
        }
        other => panic!("Expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_before_send() {
    let transport = Arc::new(token_transport());
    let client = client_over(transport.clone()).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.get_network(&cancel).await.unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(transport.request_count().await, 1);
}

#[tokio::test]
async fn test_new_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/token"))
        .and(header(TOKEN_EXPIRY_HEADER, "3600"))
        .respond_with(ResponseTemplate::new(200).set_body_string("http-token"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/network"))
        .and(header(TOKEN_HEADER, "http-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(network_body()))
        .expect(1)
        .mount(&server)
        .await;

    let options = MetadataClientOptions {
        base_url: Some(server.uri()),
        ..MetadataClientOptions::default()
    };
    let cancel = CancellationToken::new();
    let client = MetadataClient::new(options, &cancel).await.unwrap();

    let network = client.get_network(&cancel).await.unwrap();
    assert_eq!(network.ipv4.private, vec!["192.168.128.5/17"]);
    assert!(!format!("{client:?}").contains("http-token"));
}

// ============================================================================
// CIDR parsing
// ============================================================================

#[test]
fn test_ipnet_masks_host_bits() {
    let net: IpNet = "192.168.130.7/17".parse().unwrap();
    assert_eq!(net.to_string(), "192.168.128.0/17");
    assert_eq!(net.prefix_len(), 17);
    assert!(net.contains("192.168.200.1".parse::<IpAddr>().unwrap()));
    assert!(!net.contains("192.169.0.1".parse::<IpAddr>().unwrap()));
    assert!(!net.contains("::1".parse::<IpAddr>().unwrap()));

    let all: IpNet = "10.1.2.3/0".parse().unwrap();
    assert_eq!(all.network(), "0.0.0.0".parse::<IpAddr>().unwrap());
}

#[test_case("172.105.10.20" ; "missing prefix")]
#[test_case("not-an-ip/24" ; "bad address")]
#[test_case("10.0.0.0/33" ; "prefix too long")]
#[test_case("2600::/129" ; "ipv6 prefix too long")]
fn test_ipnet_rejects(input: &str) {
    let err = input.parse::<IpNet>().unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn test_ipnet_serde() {
    let net: IpNet = serde_json::from_value(json!("2600:3c03::1/64")).unwrap();
    assert_eq!(serde_json::to_value(net).unwrap(), json!("2600:3c03::/64"));
    assert!(serde_json::from_value::<IpNet>(json!("garbage")).is_err());
}
