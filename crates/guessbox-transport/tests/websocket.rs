//! Integration tests for the WebSocket transport.
//!
//! Each test serves a real axum listener on an OS-assigned port and talks
//! to it with a `tokio-tungstenite` client, so frames cross an actual
//! socket.

#![cfg(feature = "websocket")]

use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::Response;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use guessbox_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

type ClientStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Echoes every frame back, then reports the connection id once the
/// read side ends.
async fn echo(
    State(ended): State<mpsc::UnboundedSender<ConnectionId>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let conn = WebSocketConnection::new(socket);
        while let Ok(Some(frame)) = conn.recv().await {
            if conn.send(&frame).await.is_err() {
                break;
            }
        }
        let _ = ended.send(conn.id());
    })
}

/// Sends a single greeting and closes from the server side.
async fn greet_and_close(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(|socket| async move {
        let conn = WebSocketConnection::new(socket);
        let _ = conn.send(b"bye").await;
        let _ = conn.close().await;
    })
}

async fn spawn_server() -> (SocketAddr, mpsc::UnboundedReceiver<ConnectionId>)
{
    let (ended_tx, ended_rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/echo", get(echo))
        .route("/close", get(greet_and_close))
        .with_state(ended_tx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server should run");
    });
    (addr, ended_rx)
}

async fn connect(addr: SocketAddr, path: &str) -> ClientStream {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}{path}"))
        .await
        .expect("client should connect");
    ws
}

#[tokio::test]
async fn test_websocket_text_frame_echoes_as_text() {
    let (addr, _ended) = spawn_server().await;
    let mut ws = connect(addr, "/echo").await;

    ws.send(Message::text(r#"{"type":"start","from":"A"}"#))
        .await
        .unwrap();

    let reply = ws.next().await.unwrap().unwrap();
    assert_eq!(reply, Message::text(r#"{"type":"start","from":"A"}"#));
}

#[tokio::test]
async fn test_websocket_non_utf8_payload_echoes_as_binary() {
    let (addr, _ended) = spawn_server().await;
    let mut ws = connect(addr, "/echo").await;

    ws.send(Message::binary(vec![0xff, 0x00, 0xfe])).await.unwrap();

    let reply = ws.next().await.unwrap().unwrap();
    assert_eq!(reply, Message::binary(vec![0xff, 0x00, 0xfe]));
}

#[tokio::test]
async fn test_websocket_ping_is_not_surfaced_as_frame() {
    let (addr, _ended) = spawn_server().await;
    let mut ws = connect(addr, "/echo").await;

    ws.send(Message::Ping(Vec::new().into())).await.unwrap();
    ws.send(Message::text("after ping")).await.unwrap();

    // Only the text frame comes back through recv/send; pongs are
    // protocol-level and skipped here.
    loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Pong(_) => continue,
            other => {
                assert_eq!(other, Message::text("after ping"));
                break;
            }
        }
    }
}

#[tokio::test]
async fn test_websocket_client_close_ends_server_recv() {
    let (addr, mut ended) = spawn_server().await;
    let mut ws = connect(addr, "/echo").await;

    ws.close(None).await.unwrap();

    let id = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        ended.recv(),
    )
    .await
    .expect("server read loop should end")
    .expect("channel open");
    assert!(id.into_inner() > 0);
}

#[tokio::test]
async fn test_websocket_server_close_reaches_client() {
    let (addr, _ended) = spawn_server().await;
    let mut ws = connect(addr, "/close").await;

    let greeting = ws.next().await.unwrap().unwrap();
    assert_eq!(greeting, Message::text("bye"));

    let next = ws.next().await;
    assert!(
        matches!(next, Some(Ok(Message::Close(_))) | None),
        "expected close, got {next:?}"
    );
}
