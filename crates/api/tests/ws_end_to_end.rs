//! End-to-end test over a real socket: a WebSocket client connects to `/ws`,
//! a notification is sent over HTTP, and the client receives the frame.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;

use jobtrack_api::state::AppState;

async fn wait_for_connections(state: &AppState, expected: usize) {
    for _ in 0..100 {
        if state.gateway.registry().active_count().unwrap() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {expected} registered connections");
}

#[tokio::test]
async fn websocket_client_receives_broadcast_and_disconnect_is_tracked() {
    let (app, state) = common::build_test_app(common::test_config());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    state.gateway.mark_initialized();
    let server_app = app.clone();
    let server = tokio::spawn(async move { axum::serve(listener, server_app).await });

    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("WebSocket handshake should succeed");
    wait_for_connections(&state, 1).await;

    let response = common::post_json(
        app.clone(),
        "/notifications/send",
        common::interview_notification("app-1"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let frame = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(_)) => continue,
                other => panic!("WebSocket closed before a frame arrived: {other:?}"),
            }
        }
    })
    .await
    .expect("frame should arrive");

    let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(json["type"], "notification");
    assert_eq!(json["data"]["status"], "interview");
    assert_eq!(json["data"]["company"], "Acme");

    let stats = common::body_json(common::get(app, "/notifications/stats").await).await;
    assert_eq!(stats["activeConnections"], 1);
    assert_eq!(stats["connections"][0]["messagesDelivered"], 1);

    client.close(None).await.unwrap();
    wait_for_connections(&state, 0).await;
    assert_eq!(state.status.connection_stats().total_connections, 1);

    server.abort();
}
