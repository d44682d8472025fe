mod common;

use common::{BASE_URL, FakeApi, Reply, query_value, transport};
use mbta_tracker::fetch::auth::ApiKey;
use mbta_tracker::fetch::{RetryPolicy, Transport};
use std::sync::Arc;

const ROUTE_BODY: &str = r#"{"data":{"id":"Red","attributes":{"direction_names":["South","North"]}}}"#;

#[tokio::test]
async fn test_returns_parsed_document() {
    let api = FakeApi::new();
    api.on("/routes/Red", Reply::json(ROUTE_BODY));

    let doc = transport(&api)
        .request("/routes/Red", &[("fields[route]", "direction_names".to_string())])
        .await;

    assert_eq!(doc.single().unwrap()["id"], "Red");
    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        query_value(&requests[0].url, "fields[route]").as_deref(),
        Some("direction_names")
    );
    assert!(requests[0].headers.get("x-api-key").is_none());
}

#[tokio::test]
async fn test_api_key_header_is_attached() {
    let api = FakeApi::new();
    api.on("/routes/Red", Reply::json(ROUTE_BODY));
    let keyed = ApiKey::mbta(api.clone(), "secret-key").unwrap();
    let transport = Transport::new(Arc::new(keyed), BASE_URL);

    transport.request("/routes/Red", &[]).await;

    let requests = api.requests();
    assert_eq!(requests[0].headers.get("x-api-key").unwrap(), "secret-key");
}

#[tokio::test]
async fn test_retries_server_errors_then_succeeds() {
    let api = FakeApi::new();
    api.queue("/routes/Red", Reply::status(500, "oops"));
    api.queue("/routes/Red", Reply::status(502, "oops"));
    api.on("/routes/Red", Reply::json(ROUTE_BODY));

    let doc = transport(&api).request("/routes/Red", &[]).await;

    assert!(doc.single().is_some());
    assert_eq!(api.count("/routes/Red"), 3);
}

#[tokio::test]
async fn test_exhausted_retries_yield_empty_document() {
    let api = FakeApi::new();
    api.on("/stops", Reply::status(503, "unavailable"));

    let doc = transport(&api).request("/stops", &[]).await;

    assert!(doc.is_empty());
    assert_eq!(doc.included_of("trip").count(), 0);
    assert_eq!(api.count("/stops"), 3);
}

#[tokio::test]
async fn test_malformed_body_counts_as_failure() {
    let api = FakeApi::new();
    api.queue("/stops", Reply::json("<html>gateway</html>"));
    api.on("/stops", Reply::json(r#"{"data":[{"id":"1"}]}"#));

    let doc = transport(&api).request("/stops", &[]).await;

    assert_eq!(doc.resources().count(), 1);
    assert_eq!(api.count("/stops"), 2);
}

#[tokio::test]
async fn test_rate_limit_does_not_use_retry_budget() {
    let api = FakeApi::new();
    api.queue("/stops", Reply::status(429, "").with_header("retry-after", "0"));
    api.queue("/stops", Reply::status(500, ""));
    api.queue("/stops", Reply::status(429, ""));
    api.queue("/stops", Reply::status(500, ""));
    api.on("/stops", Reply::json(r#"{"data":[{"id":"1"}]}"#));

    let doc = transport(&api).request("/stops", &[]).await;

    assert_eq!(doc.resources().count(), 1);
    assert_eq!(api.count("/stops"), 5);
}

#[tokio::test]
async fn test_endless_rate_limit_gives_up() {
    let api = FakeApi::new();
    api.on("/stops", Reply::status(429, "").with_header("retry-after", "0"));
    let policy = RetryPolicy {
        max_rate_limit_waits: 2,
        ..RetryPolicy::immediate()
    };
    let transport = Transport::new(api.clone(), BASE_URL).with_retry_policy(policy);

    let doc = transport.request("/stops", &[]).await;

    assert!(doc.is_empty());
    assert_eq!(api.count("/stops"), 3);
}

#[tokio::test]
async fn test_oversized_retry_after_is_handled() {
    let api = FakeApi::new();
    api.on("/stops", Reply::status(429, "").with_header("retry-after", "1e20"));
    let policy = RetryPolicy {
        max_rate_limit_waits: 0,
        ..RetryPolicy::immediate()
    };
    let transport = Transport::new(api.clone(), BASE_URL).with_retry_policy(policy);

    let doc = transport.request("/stops", &[]).await;

    assert!(doc.is_empty());
    assert_eq!(api.count("/stops"), 1);
}
