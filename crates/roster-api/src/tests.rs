use std::sync::Arc;

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Request, StatusCode},
};
use roster_core::{
  memory::MemoryStore,
  notify::{ChannelNotifier, SubscriptionEvent},
  service::SubscriptionService,
};
use serde_json::{Value, json};
use tokio::sync::mpsc::UnboundedReceiver;
use tower::ServiceExt;

use crate::api_router;

fn app() -> (Router, UnboundedReceiver<SubscriptionEvent>) {
  let (notifier, rx) = ChannelNotifier::new();
  let service = Arc::new(SubscriptionService::new(MemoryStore::new(), notifier));
  (api_router(service), rx)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
  let response = app
    .clone()
    .oneshot(
      Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
    )
    .await
    .expect("request failed");
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
  let response = app
    .clone()
    .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
    .await
    .expect("request failed");
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_returns_ok() {
  let (app, _rx) = app();
  let response = app
    .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn subscribe_approve_revoke_over_http() {
  let (app, mut rx) = app();

  let (status, _) = post(
    &app,
    "/subscriptions",
    json!({ "from": "marcus@1337", "to": "martin@1337", "message": "bitte bitte" }),
  )
  .await;
  assert_eq!(status, StatusCode::ACCEPTED);
  assert_eq!(rx.recv().await.unwrap().kind(), "requested");

  let (status, pending) = get(&app, "/identities/martin@1337/pending").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(pending.as_array().unwrap().len(), 1);
  assert_eq!(pending[0]["from"], "marcus@1337");
  assert_eq!(pending[0]["message"], "bitte bitte");

  let (_, subscribers) = get(&app, "/identities/martin@1337/subscribers").await;
  assert_eq!(subscribers, json!([]));

  let (status, _) = post(
    &app,
    "/approvals",
    json!({ "from": "marcus@1337", "to": "martin@1337", "accept": true }),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(rx.recv().await.unwrap().kind(), "granted");

  let (_, subscribers) = get(&app, "/identities/martin@1337/subscribers").await;
  assert_eq!(subscribers, json!(["marcus@1337"]));
  let (_, subscriptions) = get(&app, "/identities/marcus@1337/subscriptions").await;
  assert_eq!(subscriptions, json!(["martin@1337"]));
  let (_, pending) = get(&app, "/identities/martin@1337/pending").await;
  assert_eq!(pending, json!([]));

  let (status, _) = post(
    &app,
    "/approvals",
    json!({ "from": "marcus@1337", "to": "martin@1337", "accept": false }),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(rx.recv().await.unwrap().kind(), "revoked");

  let (_, subscribers) = get(&app, "/identities/martin@1337/subscribers").await;
  assert_eq!(subscribers, json!([]));
}

#[tokio::test]
async fn self_subscription_is_bad_request() {
  let (app, _rx) = app();
  let (status, body) = post(
    &app,
    "/subscriptions",
    json!({ "from": "marcus@1337", "to": "marcus@1337" }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("itself"));
}

#[tokio::test]
async fn malformed_identity_is_bad_request() {
  let (app, _rx) = app();
  let (status, _) = get(&app, "/identities/nobody/subscribers").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = post(
    &app,
    "/approvals",
    json!({ "from": "@1337", "to": "martin@1337", "accept": false }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejecting_unknown_relation_succeeds() {
  let (app, mut rx) = app();
  let (status, _) = post(
    &app,
    "/approvals",
    json!({ "from": "marcus@1337", "to": "martin@1337", "accept": false }),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn self_approval_splits_on_accept() {
  let (app, mut rx) = app();
  let (status, _) = post(
    &app,
    "/approvals",
    json!({ "from": "marcus@1337", "to": "marcus@1337", "accept": false }),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = post(
    &app,
    "/approvals",
    json!({ "from": "marcus@1337", "to": "marcus@1337", "accept": true }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(rx.try_recv().is_err());
}
