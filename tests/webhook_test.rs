//! Wire-level tests of the plugin endpoint, driven through the router.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use frp_auth_plugin::http::PluginResponse;
use frp_auth_plugin::WebhookServer;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

fn router() -> Router {
    WebhookServer::new(common::store_from(common::ALICE_POLICY)).router()
}

async fn call(uri: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();
    let response = router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn call_json(op: &str, body: Value) -> Value {
    let (status, bytes) = call(&format!("/handler?op={op}"), body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&bytes).unwrap()
}

fn login(user: &str, token: &str) -> Value {
    json!({
        "version": "0.1.0",
        "op": "Login",
        "content": {
            "user": user,
            "privilege_key": "0123456789abcdef",
            "run_id": "run-1",
            "metas": {"token": token},
            "client_address": "203.0.113.7:51000"
        }
    })
}

fn new_proxy(proxy_name: &str, proxy_type: &str, domains: &[&str]) -> Value {
    json!({
        "version": "0.1.0",
        "op": "NewProxy",
        "content": {
            "user": "alice",
            "metas": {"token": "s3cr3t", "team": "infra"},
            "proxy_name": proxy_name,
            "proxy_type": proxy_type,
            "remote_port": 0,
            "custom_domains": domains,
            "subdomain": "",
            "use_encryption": false
        }
    })
}

#[tokio::test]
async fn test_login_accepted() {
    let body = call_json("Login", login("alice", "s3cr3t")).await;
    assert_eq!(body, json!({"reject": false, "unchange": true}));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let body = call_json("Login", login("alice", "wrong")).await;
    assert_eq!(body, json!({"reject": true, "reject_reason": "invalid password"}));
}

#[tokio::test]
async fn test_login_unknown_user() {
    for user in ["bob", "", "ALICE"] {
        let body = call_json("Login", login(user, "s3cr3t")).await;
        assert_eq!(body, json!({"reject": true, "reject_reason": "invalid user"}), "user {user:?}");
    }
}

#[tokio::test]
async fn test_new_proxy_rewrites_domains_and_credentials() {
    let body = call_json("NewProxy", new_proxy("web1", "http", &["evil.com"])).await;

    let response: PluginResponse = serde_json::from_value(body.clone()).unwrap();
    assert!(!response.reject);
    assert_eq!(response.unchange, Some(false));

    let content = &body["content"];
    assert_eq!(content["custom_domains"], json!(["alice.example.com"]));
    assert_eq!(content["http_user"], json!("a"));
    assert_eq!(content["http_pwd"], json!("p"));
    assert_eq!(content["user"], json!("alice"));
    assert_eq!(content["proxy_name"], json!("web1"));
    assert_eq!(content["proxy_type"], json!("http"));
    assert_eq!(content["metas"], json!({"token": "s3cr3t", "team": "infra"}));
    assert_eq!(content["use_encryption"], json!(false));
}

#[tokio::test]
async fn test_new_proxy_non_http_rejected() {
    for name in ["web1", "unknown"] {
        let body = call_json("NewProxy", new_proxy(name, "tcp", &[])).await;
        assert_eq!(body, json!({"reject": true, "reject_reason": "proxy not http"}), "proxy {name}");
    }
}

#[tokio::test]
async fn test_new_proxy_unknown_route_rejected() {
    let body = call_json("NewProxy", new_proxy("web2", "http", &["alice.example.com"])).await;
    assert_eq!(body["reject"], json!(true));
    assert_eq!(body["reject_reason"], json!("invalid proxy"));
}

#[tokio::test]
async fn test_unknown_operation_passes_through() {
    let body = call_json("Ping", json!({"content": {}})).await;
    assert_eq!(body, json!({"reject": false, "unchange": true}));

    let (status, bytes) = call("/handler?op=CloseProxy", "garbage").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_slice::<Value>(&bytes).unwrap(),
        json!({"reject": false, "unchange": true})
    );
}

#[tokio::test]
async fn test_missing_op_is_bad_request() {
    for uri in ["/handler", "/handler?op=", "/handler?other=Login"] {
        let (status, bytes) = call(uri, login("alice", "s3cr3t").to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(String::from_utf8(bytes).unwrap(), "Missing 'op' in URL");
    }
}

#[tokio::test]
async fn test_repeated_op_uses_first_value() {
    let (status, bytes) = call("/handler?op=Login&op=Ping", login("alice", "wrong").to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_slice::<Value>(&bytes).unwrap(),
        json!({"reject": true, "reject_reason": "invalid password"})
    );

    let (status, bytes) = call("/handler?op=&op=Login", login("alice", "s3cr3t").to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(bytes).unwrap(), "Missing 'op' in URL");
}

#[tokio::test]
async fn test_malformed_body_is_generic_bad_request() {
    for body in ["{", "[]", r#"{"content": {"user": 7}}"#, ""] {
        let (status, bytes) = call("/handler?op=Login", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
        assert_eq!(String::from_utf8(bytes).unwrap(), "Bad JSON");
    }

    let (status, _) = call("/handler?op=NewProxy", r#"{"content": {"remote_port": -1}}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_post_is_routed() {
    let request = Request::builder()
        .method("GET")
        .uri("/handler?op=Login")
        .body(Body::empty())
        .unwrap();
    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = call("/other?op=Login", "{}").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_set_and_propagated() {
    let request = Request::builder()
        .method("POST")
        .uri("/handler?op=Ping")
        .body(Body::empty())
        .unwrap();
    let response = router().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .method("POST")
        .uri("/handler?op=Ping")
        .header("x-request-id", "frps-42")
        .body(Body::empty())
        .unwrap();
    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "frps-42");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let huge = format!(r#"{{"content": {{"user": "{}"}}}}"#, "a".repeat(128 * 1024));
    let (status, _) = call("/handler?op=Login", huge).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
