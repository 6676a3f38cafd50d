use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::ws::gateway::WsGateway;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with the gateway and
/// managed by a sender task plus the receive loop below.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.gateway))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection (`on_connect`).
///   2. Spawns a sender task that drains the connection's outbound channel.
///   3. Processes inbound frames on the current task.
///   4. Reports the disconnect (`on_disconnect`).
async fn handle_socket(socket: WebSocket, gateway: Arc<WsGateway>) {
    let conn_id = uuid::Uuid::new_v4().to_string();

    let mut rx = match gateway.on_connect(conn_id.clone()).await {
        Ok(rx) => rx,
        Err(e) => {
            tracing::warn!(conn_id = %conn_id, error = %e, "Rejected WebSocket connection");
            return;
        }
    };
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_msg) => {
                // Clients only listen; inbound payloads are ignored.
            }
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    gateway.on_disconnect(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
