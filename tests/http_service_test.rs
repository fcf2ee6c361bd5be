//! End-to-end HTTP tests over a real TCP listener.

mod common;

use std::time::Duration;

use spam_guard::{ArtifactMode, PredictionServer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

async fn start_server() -> (std::net::SocketAddr, CancellationToken, tokio::task::JoinHandle<()>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let paths = common::write_spam_artifacts(dir.path());
    let config = common::config_for(&paths, ArtifactMode::Plaintext, "SG_IT_HTTP_UNUSED");
    let server = PredictionServer::from_config(config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.serve_on(listener, token).await.unwrap();
    });
    (addr, shutdown, handle, dir)
}

async fn send_raw(addr: std::net::SocketAddr, request: String) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

fn post_predict(body: &str) -> String {
    format!(
        "POST /predict HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

#[tokio::test]
async fn predict_over_tcp_then_shutdown() {
    let (addr, shutdown, handle, _dir) = start_server().await;

    let response = send_raw(addr, post_predict(r#"{"emails": ["FREE MONEY NOW", "meeting at 3pm"]}"#)).await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("[1,0]"), "{response}");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop after cancellation")
        .unwrap();
}

#[tokio::test]
async fn malformed_request_does_not_stop_the_service() {
    let (addr, shutdown, handle, _dir) = start_server().await;

    let bad = send_raw(addr, post_predict("{not json")).await;
    assert!(bad.starts_with("HTTP/1.1 400"), "{bad}");

    let good = send_raw(addr, post_predict(r#"{"emails": []}"#)).await;
    assert!(good.starts_with("HTTP/1.1 200"), "{good}");
    assert!(good.ends_with("[]"), "{good}");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn health_over_tcp() {
    let (addr, shutdown, handle, _dir) = start_server().await;

    let response = send_raw(
        addr,
        "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".to_string(),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains(r#""status":"healthy""#), "{response}");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
}
