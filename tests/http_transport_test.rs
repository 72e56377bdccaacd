//! End-to-end tests of HttpTransport against an axum mock server.

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::post};
use remote_explorer::{
    ClientConfig, Color, ExplorerErrorKind, MovementResult, RemoteGameSessionFactory, SessionIdentifier,
    Tile,
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;

async fn connect(Json(body): Json<Value>) -> Json<Value> {
    if body["username"] == "banned" {
        return Json(json!({ "success": false, "message": "user banned" }));
    }
    let label = body["vsid"]["identifierStr"].as_str().unwrap_or("--");
    Json(json!({ "success": true, "sid": format!("sid-{}", label) }))
}

async fn move_agent(Json(body): Json<Value>) -> impl IntoResponse {
    match body["dx"].as_i64() {
        Some(9) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "boom" }))),
        Some(7) => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::OK, Json(json!({ "success": true, "moved": true, "alive": true })))
        }
        _ => {
            let alive = body["dy"].as_i64().unwrap_or(0) >= 0;
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "moved": true,
                    "alive": alive,
                    "message": format!("moved {}", body["sid"].as_str().unwrap_or("?")),
                    "discovered": { "str": "AB" }
                })),
            )
        }
    }
}

/// Starts the mock server on its own runtime thread and returns its address.
fn spawn_server() -> SocketAddr {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
        runtime.block_on(async move {
            let app = Router::new()
                .route("/connect", post(connect))
                .route("/move", post(move_agent));
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind");
            tx.send(listener.local_addr().expect("No local address"))
                .expect("Failed to report address");
            axum::serve(listener, app).await.expect("Server failed");
        });
    });
    rx.recv().expect("Server did not start")
}

fn config_for(addr: SocketAddr) -> ClientConfig {
    ClientConfig::new(format!("http://{}/", addr)).with_username("Example")
}

#[test]
fn test_blocking_round_trip() {
    let addr = spawn_server();
    let factory = RemoteGameSessionFactory::new(&config_for(addr)).unwrap();
    let mut ident = SessionIdentifier::from_visual("[]", Color::Magenta).unwrap();

    let session = factory.create(&mut ident).unwrap();
    assert_eq!(ident.sid(), Some("sid-[]"));

    let result = session.move_agent((1, 0)).unwrap();
    let tile = Tile::try_from("AB").unwrap();
    assert_eq!(result, MovementResult::new(true, true, Some(tile)));
    assert_eq!(session.last_message().as_deref(), Some("moved sid-[]"));

    let result = session.move_agent((0, -1)).unwrap();
    assert!(!result.is_agent_alive());
    assert!(!session.is_agent_alive());
}

#[test]
fn test_background_move_over_http() {
    let addr = spawn_server();
    let factory = RemoteGameSessionFactory::new(&config_for(addr)).unwrap();
    let session = factory.create("Z").unwrap();

    let handle = session.move_async((1, 1)).unwrap();

    let result = handle.wait(Some(Duration::from_secs(5))).expect("move timed out");
    assert!(result.moved_successfully());
    assert_eq!(session.discovered_tile(), Tile::try_from("AB").ok());
}

#[test]
fn test_error_status_is_transport_error() {
    let addr = spawn_server();
    let factory = RemoteGameSessionFactory::new(&config_for(addr)).unwrap();
    let session = factory.create(()).unwrap();
    session.move_agent((1, 0)).unwrap();
    let before = session.state();

    let err = session.move_agent((9, 0)).unwrap_err();
    assert!(matches!(err.kind, ExplorerErrorKind::Transport(_)));
    assert_eq!(session.state(), before);

    let handle = session.move_async((9, 0)).unwrap();
    assert_eq!(handle.wait(Some(Duration::from_secs(5))), Some(MovementResult::failed()));
    assert!(handle.transport_failure().unwrap().contains("500"));
}

#[test]
fn test_request_timeout_is_transport_error() {
    let addr = spawn_server();
    let config = config_for(addr).with_timeout_secs(1u64);
    let factory = RemoteGameSessionFactory::new(&config).unwrap();
    let session = factory.create(()).unwrap();

    let err = session.move_agent((7, 0)).unwrap_err();

    assert!(matches!(err.kind, ExplorerErrorKind::Transport(_)));
}

#[test]
fn test_background_request_timeout_resolves_failed() {
    let addr = spawn_server();
    let config = config_for(addr).with_timeout_secs(1u64);
    let factory = RemoteGameSessionFactory::new(&config).unwrap();
    let session = factory.create(()).unwrap();

    let handle = session.move_async((7, 0)).unwrap();

    assert_eq!(handle.wait(Some(Duration::from_secs(5))), Some(MovementResult::failed()));
    assert!(handle.transport_failure().is_some());
    assert_eq!(session.last_message(), handle.transport_failure());
}

#[test]
fn test_rejected_connect_over_http() {
    let addr = spawn_server();
    let config = config_for(addr).with_username("banned");
    let factory = RemoteGameSessionFactory::new(&config).unwrap();

    let err = factory.create(()).unwrap_err();

    assert_eq!(err.kind, ExplorerErrorKind::ConnectRejected("user banned".to_string()));
}

#[test]
fn test_unreachable_server_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let factory = RemoteGameSessionFactory::new(&config_for(addr)).unwrap();

    let err = factory.create(()).unwrap_err();

    assert!(matches!(err.kind, ExplorerErrorKind::Transport(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_round_trip_on_runtime() {
    let addr = tokio::task::spawn_blocking(spawn_server).await.unwrap();
    let factory = RemoteGameSessionFactory::new(&config_for(addr)).unwrap();

    let session = factory.create_async("R").await.unwrap();
    assert_eq!(session.sid(), "sid-R");

    let result = session.move_agent_async((0, 1)).await.unwrap();
    assert!(result.is_agent_alive());

    let handle = session.move_async((1, 0)).unwrap();
    let waiter = handle.clone();
    let result = tokio::task::spawn_blocking(move || waiter.wait(Some(Duration::from_secs(5))))
        .await
        .unwrap();
    assert_eq!(result.map(|r| r.moved_successfully()), Some(true));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_calls_inside_runtime_return_errors() {
    let addr = tokio::task::spawn_blocking(spawn_server).await.unwrap();
    let factory = RemoteGameSessionFactory::new(&config_for(addr)).unwrap();

    let err = factory.create("B").unwrap_err();
    assert!(matches!(err.kind, ExplorerErrorKind::Transport(_)));

    let session = factory.create_async("B").await.unwrap();
    let before = session.state();
    let err = session.move_agent((1, 0)).unwrap_err();
    assert!(matches!(err.kind, ExplorerErrorKind::Transport(_)));
    assert_eq!(session.state(), before);
}
