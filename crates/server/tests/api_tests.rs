//! Router-level tests over a temporary data root.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use spectralink_core::codec::{decode, encode};
use spectralink_server::app;
use spectralink_server::config::{AppState, ServerConfig};
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_app(dir: &TempDir) -> Router {
    let config = ServerConfig {
        bcrypt_cost: 4,
        ..ServerConfig::with_base_dir(dir.path())
    };
    let state = AppState::open(&config).await.unwrap();
    app(state, config.max_upload_bytes())
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = call(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, bytes) = call(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_register_login_and_roster() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let wire = encode("alice");
    let (status, _) = post_json(
        &app,
        "/register",
        json!({ "username": wire, "password": encode("hunter22"), "email": encode("a@x.io") }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Same plaintext name under a new token is a duplicate.
    let (status, body) = post_json(
        &app,
        "/register",
        json!({ "username": encode("alice"), "password": encode("other") }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Username already exists");

    let (status, body) = post_json(
        &app,
        "/login",
        json!({ "username": encode("alice"), "password": encode("hunter22") }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], wire.as_str());

    let (status, _) = post_json(
        &app,
        "/login",
        json!({ "username": encode("alice"), "password": encode("wrong") }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, roster) = get_json(&app, "/users").await;
    assert_eq!(roster, json!([{ "username": wire }]));
}

#[tokio::test]
async fn test_message_scopes() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    for (from, to, body) in [("a", "b", "1"), ("b", "a", "2"), ("c", "a", "3")] {
        let (status, resp) =
            post_json(&app, "/send", json!({ "from": from, "to": to, "body": body })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, json!({ "status": "ok" }));
    }

    let (_, conversation) = get_json(&app, "/messages?from=b&to=a").await;
    let bodies: Vec<&str> = conversation
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["1", "2"]);

    let (_, everything) = get_json(&app, "/messages?from=Hacker").await;
    assert_eq!(everything.as_array().unwrap().len(), 3);

    let (_, nothing) = get_json(&app, "/messages?from=a").await;
    assert_eq!(nothing, json!([]));
}

#[tokio::test]
async fn test_send_validation() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let (status, _) = post_json(&app, "/send", json!({ "from": "a", "body": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        post_json(&app, "/send", json!({ "from": "a", "group": "nope", "body": "x" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tagged_identities_in_query() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;
    let alice = encode("alice");
    let bob = encode("bob");
    let body = encode("hello");

    post_json(&app, "/send", json!({ "from": alice, "to": bob, "body": body })).await;

    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("from", &bob)
        .append_pair("to", &alice)
        .finish();
    let uri = format!("/messages?{}", query);
    let (_, messages) = get_json(&app, &uri).await;
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(decode(messages[0]["body"].as_str().unwrap()).as_deref(), Some("hello"));
    assert!(messages[0]["id"].is_string());
    assert!(messages[0]["created_at"].is_string());
}

#[tokio::test]
async fn test_groups() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let (status, group) =
        post_json(&app, "/groups", json!({ "name": "rust", "members": ["a", "b"] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["name"], "rust");

    let (status, _) = post_json(&app, "/groups", json!({ "name": "rust", "members": [] })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, groups) = get_json(&app, "/groups?user=b").await;
    assert_eq!(groups.as_array().unwrap().len(), 1);
    let (_, groups) = get_json(&app, "/groups?user=z").await;
    assert_eq!(groups, json!([]));

    let (status, _) = post_json(&app, "/groups", json!({ "name": " ", "members": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    post_json(&app, "/send", json!({ "from": "a", "group": "rust", "body": "hi all" })).await;
    let (_, messages) = get_json(&app, "/messages?group=rust").await;
    assert_eq!(messages[0]["group"], "rust");
}

#[tokio::test]
async fn test_upload_then_fetch() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let boundary = "XyZbOuNdArY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nhello file\r\n--{b}--\r\n",
        b = boundary
    );
    let req = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, bytes) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let resp: Value = serde_json::from_slice(&bytes).unwrap();
    let url = resp["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/files/"));
    assert!(url.ends_with("/notes.txt"));

    let req = Request::builder().uri(&url).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain");
    let data = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&data[..], b"hello file");

    let (_, missing) = get_json(&app, "/files/deadbeef/notes.txt").await;
    assert!(missing["error"]["message"].is_string());
}

#[tokio::test]
async fn test_concurrent_group_creation_conflicts() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let body = json!({ "name": "ops", "members": ["a"] });
    let (first, second) = tokio::join!(
        post_json(&app, "/groups", body.clone()),
        post_json(&app, "/groups", body.clone()),
    );

    let statuses = [first.0, second.0];
    assert!(statuses.contains(&StatusCode::OK));
    assert!(statuses.contains(&StatusCode::CONFLICT));
}
