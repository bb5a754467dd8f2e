//! Integration tests for the API

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use serverpulse_backend::{
    api::AppState, config::Config, liveness::LivenessStore, notify::Notification,
    users::UserRegistry,
};

const SECRET: &str = "test-secret";

struct TestApp {
    router: axum::Router,
    store: LivenessStore,
    notify_rx: mpsc::Receiver<Notification>,
}

fn setup_app() -> TestApp {
    let config = Config::default();
    let store = LivenessStore::new();
    let users_dir = std::env::temp_dir().join(format!("serverpulse-api-{}", uuid::Uuid::new_v4()));
    let users = UserRegistry::load(&users_dir);
    let (notify_tx, notify_rx) = mpsc::channel(16);

    let state = AppState::new(
        config,
        store.clone(),
        users,
        SECRET.to_string(),
        notify_tx,
    );

    TestApp {
        router: serverpulse_backend::create_router(state),
        store,
        notify_rx,
    }
}

fn heartbeat_request(ip: &str, token: &str) -> Request<Body> {
    let addr = SocketAddr::new(ip.parse::<IpAddr>().unwrap(), 4242);
    Request::builder()
        .method("POST")
        .uri("/api/heartbeat")
        .header("content-type", "application/json")
        .extension(ConnectInfo(addr))
        .body(Body::from(json!({ "token": token }).to_string()))
        .unwrap()
}

fn servers_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/servers");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_heartbeat_accepts_valid_token() {
    let mut app = setup_app();

    let response = app
        .router
        .oneshot(heartbeat_request("10.0.0.1", SECRET))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "ok");
    assert_eq!(json["code"], 200);

    // First sighting queues a discovery notification.
    assert_eq!(
        app.notify_rx.try_recv().unwrap(),
        Notification::Discovered {
            identity: "10.0.0.1".into()
        }
    );
    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn test_heartbeat_rejects_invalid_token() {
    let mut app = setup_app();

    let response = app
        .router
        .oneshot(heartbeat_request("10.0.0.1", "wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "FORBIDDEN");

    // Nothing recorded, nothing notified.
    assert!(app.store.is_empty().await);
    assert!(app.notify_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_repeat_heartbeat_is_unchanged() {
    let mut app = setup_app();

    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(heartbeat_request("10.0.0.1", SECRET))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Only the discovery notification, no matter how often it reports.
    assert!(app.notify_rx.try_recv().is_ok());
    assert!(app.notify_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_servers_requires_token() {
    let app = setup_app();

    let response = app.router.oneshot(servers_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_servers_lists_in_first_seen_order() {
    let app = setup_app();

    for ip in ["10.0.0.2", "10.0.0.1", "10.0.0.3"] {
        app.router
            .clone()
            .oneshot(heartbeat_request(ip, SECRET))
            .await
            .unwrap();
    }

    let response = app
        .router
        .oneshot(servers_request(Some(SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["total"], 3);

    let identities: Vec<_> = json["data"]["servers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["identity"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(identities, ["10.0.0.2", "10.0.0.1", "10.0.0.3"]);
    assert!(json["data"]["servers"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["active"] == true));
}

#[tokio::test(start_paused = true)]
async fn test_reactivation_notifies_again() {
    let mut app = setup_app();
    let window = Duration::from_secs(10);

    app.router
        .clone()
        .oneshot(heartbeat_request("10.0.0.1", SECRET))
        .await
        .unwrap();
    assert!(app.notify_rx.try_recv().is_ok());

    // Server goes silent and a sweep marks it notified.
    tokio::time::advance(Duration::from_secs(20)).await;
    let candidates = app.store.find_inactive_unnotified(window).await;
    assert_eq!(candidates, vec!["10.0.0.1".to_string()]);
    app.store.mark_notified_inactive(&candidates, window).await;

    // The next heartbeat is a reactivation.
    tokio::time::advance(Duration::from_secs(5)).await;
    app.router
        .clone()
        .oneshot(heartbeat_request("10.0.0.1", SECRET))
        .await
        .unwrap();

    assert_eq!(
        app.notify_rx.try_recv().unwrap(),
        Notification::Reactivated {
            identity: "10.0.0.1".into()
        }
    );
}
