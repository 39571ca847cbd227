//! Tests for the service client module

use super::*;
use crate::error::{Error, Result};
use crate::pagination::PaginationOptions;
use crate::types::{BackoffType, JsonValue};
use async_trait::async_trait;
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use reqwest::Response;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_service_config_default() {
    let config = ServiceConfig::new("http://service.com/");
    assert_eq!(config.url, "http://service.com/");
    assert_eq!(config.name, "HttpServiceClient");
    assert_eq!(config.timeout(), Duration::from_secs(30));
    assert!(config.verify_ssl);
    assert!(config.client.is_none());
    assert_eq!(config.params, RequestParams::default());
}

#[test]
fn test_service_config_from_yaml() {
    let config = ServiceConfig::from_yaml(
        r"
url: https://api.example.com/v1/
name: ExampleService
client:
  name: my_client
  version: 1.2.3
headers:
  Accept: application/json
auth:
  type: basic
  username: foo
  password: bar
expected_response_codes: [404]
max_retries: 2
",
    )
    .unwrap();

    assert_eq!(config.url, "https://api.example.com/v1/");
    assert_eq!(config.name, "ExampleService");
    let client = config.client.unwrap();
    assert_eq!(client.user_agent(), "my_client 1.2.3 - unknown");
    assert_eq!(
        config.params.headers.get("Accept"),
        Some(&"application/json".to_string())
    );
    assert_eq!(config.params.auth, Some(Auth::basic("foo", "bar")));
    assert_eq!(config.params.expected_response_codes, Some(vec![404]));
    assert_eq!(config.params.max_retries, Some(2));
}

#[test]
fn test_service_config_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("service.yaml");
    std::fs::write(&file, "url: http://localhost:8080\ntimeout_secs: 5\n").unwrap();

    let config = ServiceConfig::from_yaml_file(&file).unwrap();
    assert_eq!(config.url, "http://localhost:8080");
    assert_eq!(config.timeout_secs, 5);

    let missing = ServiceConfig::from_yaml_file(dir.path().join("missing.yaml"));
    assert!(matches!(missing, Err(Error::Io(_))));
}

#[test]
fn test_client_identity_defaults() {
    let identity = ClientIdentity::new("my_client");
    assert_eq!(identity.user_agent(), "my_client x.y.z - unknown");

    let identity = identity.version("1.2.3").app("my_app");
    assert_eq!(identity.user_agent(), "my_client 1.2.3 - my_app");
}

#[test]
fn test_request_params_merge() {
    let shared = RequestParams::new()
        .header("name", "value")
        .header("thomas", "kittens")
        .query("lang", "en")
        .auth(Auth::basic("foo", "bar"))
        .retries(2);

    let merged = shared.merged(RequestParams::new().header("thomas", "homegirl").expect([404]));

    assert_eq!(merged.headers.get("name"), Some(&"value".to_string()));
    assert_eq!(merged.headers.get("thomas"), Some(&"homegirl".to_string()));
    assert_eq!(merged.query.get("lang"), Some(&"en".to_string()));
    assert_eq!(merged.auth, Some(Auth::basic("foo", "bar")));
    assert_eq!(merged.max_retries, Some(2));
    assert_eq!(merged.expected_response_codes, Some(vec![404]));

    // Shared params are left untouched
    assert_eq!(shared.headers.get("thomas"), Some(&"kittens".to_string()));
}

#[test]
fn test_request_params_success_demand() {
    let params = RequestParams::new();
    assert!(params.is_success(200));
    assert!(params.is_success(204));
    assert!(!params.is_success(302));
    assert!(!params.is_success(404));

    let params = params.expect([404]);
    assert!(params.is_success(404));
    assert!(!params.is_success(500));
}

#[test]
fn test_request_params_redacted() {
    let params = RequestParams::new()
        .auth(Auth::bearer("secret"))
        .header("X-Id", "1");
    let redacted = params.redacted();
    assert!(redacted.auth.is_none());
    assert_eq!(redacted.headers, params.headers);
    assert!(!format!("{redacted:?}").contains("secret"));
}

#[test]
fn test_request_params_cookie_header() {
    assert!(RequestParams::new().cookie_header().is_none());
    let params = RequestParams::new().cookie("b", "2").cookie("a", "1");
    assert_eq!(params.cookie_header(), Some("a=1; b=2".to_string()));
}

// ============================================================================
// Client Tests
// ============================================================================

#[test]
fn test_client_rejects_invalid_url() {
    let err = HttpServiceClient::from_url("not a url").unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

#[test]
fn test_url_is_composed_properly() {
    let service = HttpServiceClient::from_url("http://service.com/some/path/").unwrap();
    assert_eq!(
        service.build_url("/get-endpoint"),
        "http://service.com/some/path/get-endpoint"
    );
    assert_eq!(
        service.build_url("get-endpoint"),
        "http://service.com/some/path/get-endpoint"
    );
    assert_eq!(
        service.build_url("https://other.com/x"),
        "https://other.com/x"
    );
}

#[test]
fn test_calculate_backoff() {
    let config = ServiceConfig::new("http://service.com/").backoff(
        BackoffType::Exponential,
        Duration::from_millis(100),
        Duration::from_secs(1),
    );
    let service = HttpServiceClient::new(config).unwrap();

    assert_eq!(service.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(service.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(service.calculate_backoff(10), Duration::from_secs(1));
    assert_eq!(service.calculate_backoff(64), Duration::from_secs(1));
}

#[tokio::test]
async fn test_get_request_with_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get-endpoint"))
        .and(query_param("foo", "bar"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    let response = service
        .get("/get-endpoint", RequestParams::new().query("foo", "bar"))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_all_verbs_return_responses() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/path"))
        .respond_with(ResponseTemplate::new(200))
        .expect(7)
        .mount(&mock_server)
        .await;

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    assert!(service.get("/path", RequestParams::new()).await.is_ok());
    assert!(service.put("/path", RequestParams::new()).await.is_ok());
    assert!(service.delete("/path", RequestParams::new()).await.is_ok());
    assert!(service.post("/path", RequestParams::new()).await.is_ok());
    assert!(service.patch("/path", RequestParams::new()).await.is_ok());
    assert!(service.options("/path", RequestParams::new()).await.is_ok());
    assert!(service.head("/path", RequestParams::new()).await.is_ok());
}

#[tokio::test]
async fn test_headers_are_passed_and_overridable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("name", "value"))
        .and(header("thomas", "homegirl"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ServiceConfig::new(mock_server.uri()).params(
        RequestParams::new()
            .header("name", "value")
            .header("thomas", "kittens"),
    );
    let service = HttpServiceClient::new(config).unwrap();

    service
        .get("/", RequestParams::new().header("thomas", "homegirl"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sets_authentication_when_provided() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/authed-endpoint"))
        .and(header("Authorization", "Basic Zm9vOmJhcg=="))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ServiceConfig::new(mock_server.uri())
        .params(RequestParams::new().auth(Auth::basic("foo", "bar")));
    let service = HttpServiceClient::new(config).unwrap();

    service
        .get("/authed-endpoint", RequestParams::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_client_identification_adds_user_agent_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .and(header("User-Agent", "my_client 1.2.3 - my_app"))
        .and(header("Foo", "Bar"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ServiceConfig::new(mock_server.uri())
        .client(ClientIdentity::new("my_client").version("1.2.3").app("my_app"))
        .params(RequestParams::new().header("Foo", "Bar"));
    let service = HttpServiceClient::new(config).unwrap();

    service.get("/test", RequestParams::new()).await.unwrap();
}

#[tokio::test]
async fn test_json_requests_have_formatted_data() {
    let mock_server = MockServer::start().await;
    let data = json!({"back": "forth", "forever": true, "snowman-quote": "\"☃\""});

    Mock::given(method("POST"))
        .and(path("/data-endpoint"))
        .and(header("Content-Type", JSON_CONTENT_TYPE))
        .and(body_json(&data))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    let response = service
        .post("/data-endpoint", RequestParams::new().json(data.clone()))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn test_plain_data_is_sent_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(body_string("raw payload"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    service
        .put("/put-endpoint", RequestParams::new().data("raw payload"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_response_raises_service_error_with_details() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("content"))
        .mount(&mock_server)
        .await;

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    let err = service
        .get("/broken", RequestParams::new())
        .await
        .unwrap_err();

    match err {
        Error::HttpService {
            status,
            url,
            details,
        } => {
            assert_eq!(status, 500);
            assert_eq!(details, "content");
            assert!(url.ends_with("/broken"));
        }
        other => panic!("Expected HttpService error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_details_are_parsed_as_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad"})))
        .mount(&mock_server)
        .await;

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    let err = service.get("/", RequestParams::new()).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), r#"code: 400, details: {"error":"bad"}"#);
}

#[tokio::test]
async fn test_no_error_for_expected_response_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("content"))
        .mount(&mock_server)
        .await;

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    let response = service
        .get("/notfound", RequestParams::new().expect([404]))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_get_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": ["alice"]})))
        .mount(&mock_server)
        .await;

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    let body: JsonValue = service.get_json("/users", RequestParams::new()).await.unwrap();
    assert_eq!(body["users"][0], "alice");
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    let err = service
        .get("/slow", RequestParams::new().timeout_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_ms: 1000 }));
}

#[tokio::test]
async fn test_connection_errors_are_retried_then_returned() {
    let config = ServiceConfig::new("http://127.0.0.1:1").backoff(
        BackoffType::Constant,
        Duration::from_millis(1),
        Duration::from_millis(1),
    );
    let service = HttpServiceClient::new(config).unwrap();

    let err = service
        .get("/", RequestParams::new().retries(2))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

// ============================================================================
// Hook Tests
// ============================================================================

#[derive(Default)]
struct CountingHooks {
    sent: AtomicUsize,
    received: AtomicUsize,
}

#[async_trait]
impl RequestHooks for CountingHooks {
    async fn pre_send(&self, params: &mut RequestParams) -> Result<()> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        params.headers.insert("X-Signed".to_string(), "yes".to_string());
        Ok(())
    }

    async fn post_send(&self, _response: &Response, _params: &RequestParams) -> Result<()> {
        self.received.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_hooks_run_around_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("X-Signed", "yes"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let hooks = Arc::new(CountingHooks::default());
    let service = HttpServiceClient::from_url(mock_server.uri())
        .unwrap()
        .with_hooks(hooks.clone());

    // The success demand still applies after post_send
    let err = service.get("/", RequestParams::new()).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(hooks.sent.load(Ordering::SeqCst), 1);
    assert_eq!(hooks.received.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_paginate_over_service() {
    let mock_server = MockServer::start().await;

    for (page, next) in [("1", json!("2")), ("2", JsonValue::Null)] {
        let start: u64 = if page == "1" { 0 } else { 3 };
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page", page))
            .and(query_param("page_size", "3"))
            .and(query_param("status", "open"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [start, start + 1, start + 2],
                "next": next,
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    let options = PaginationOptions::new()
        .page_size(3)
        .results_key("results")
        .next_key("next");

    let items: Vec<u64> = service
        .paginate::<u64>("/items", RequestParams::new().query("status", "open"), options)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(items, vec![0, 1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_paginate_propagates_service_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let service = HttpServiceClient::from_url(mock_server.uri()).unwrap();
    let options = PaginationOptions::new()
        .page_size(2)
        .page_param("offset")
        .page_size_param("limit")
        .pagination_type(crate::pagination::PaginationType::Item);

    let result: Result<Vec<u64>> = service
        .paginate::<u64>("/", RequestParams::new(), options)
        .try_collect()
        .await;
    assert_eq!(result.unwrap_err().status(), Some(503));
}
