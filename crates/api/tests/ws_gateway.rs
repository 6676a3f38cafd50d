//! Unit tests for `WsGateway`.
//!
//! These tests exercise the WebSocket gateway directly, without performing
//! any HTTP upgrades. They verify connect/disconnect bookkeeping against the
//! registry, the transport send path, heartbeat cleanup and shutdown.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::ws::Message;
use jobtrack_api::ws::{start_heartbeat, WsGateway};
use jobtrack_core::error::CoreError;
use jobtrack_events::{ConnectionRegistry, DeliveryError, Transport};

fn gateway() -> WsGateway {
    WsGateway::new(Arc::new(ConnectionRegistry::new()), 4)
}

// ---------------------------------------------------------------------------
// Test: new gateway starts with zero connections and uninitialized
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_gateway_is_empty_and_uninitialized() {
    let gateway = gateway();

    assert_eq!(gateway.connection_count().await, 0);
    assert!(!gateway.is_initialized());

    gateway.mark_initialized();
    assert!(gateway.is_initialized());
}

// ---------------------------------------------------------------------------
// Test: on_connect registers with the registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_registers_connection() {
    let gateway = gateway();

    let _rx = gateway.on_connect("conn-1".to_string()).await.unwrap();

    assert_eq!(gateway.connection_count().await, 1);
    assert!(gateway.registry().get("conn-1").unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Test: duplicate ids are rejected and the original session survives
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_connect_is_rejected() {
    let gateway = gateway();
    let mut rx = gateway.on_connect("conn-1".to_string()).await.unwrap();

    assert_matches!(
        gateway.on_connect("conn-1".to_string()).await,
        Err(CoreError::DuplicateConnection(id)) if id == "conn-1"
    );

    gateway.send("conn-1", "still-original").await.unwrap();
    let msg = rx.recv().await.expect("original rx should still receive");
    assert!(matches!(&msg, Message::Text(t) if t.as_str() == "still-original"));
    assert_eq!(gateway.registry().stats().unwrap().total_connections, 1);
}

// ---------------------------------------------------------------------------
// Test: on_disconnect removes from both gateway and registry; idempotent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disconnect_unregisters_and_is_idempotent() {
    let gateway = gateway();
    let _rx = gateway.on_connect("conn-1".to_string()).await.unwrap();

    gateway.on_disconnect("conn-1").await;
    gateway.on_disconnect("conn-1").await;
    gateway.on_disconnect("nonexistent").await;

    assert_eq!(gateway.connection_count().await, 0);
    assert!(gateway.registry().get("conn-1").unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: send pushes a text frame; unknown and closed channels fail
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_delivers_text_frame() {
    let gateway = gateway();
    let mut rx = gateway.on_connect("conn-1".to_string()).await.unwrap();

    gateway.send("conn-1", "{\"hello\":1}").await.unwrap();

    let msg = rx.recv().await.unwrap();
    assert!(matches!(&msg, Message::Text(t) if t.as_str() == "{\"hello\":1}"));
}

#[tokio::test]
async fn send_to_unknown_connection_fails() {
    let gateway = gateway();

    assert_eq!(
        gateway.send("ghost", "x").await,
        Err(DeliveryError::UnknownConnection)
    );
}

#[tokio::test]
async fn send_to_closed_channel_fails() {
    let gateway = gateway();
    let rx = gateway.on_connect("conn-1".to_string()).await.unwrap();
    drop(rx);

    assert_eq!(
        gateway.send("conn-1", "x").await,
        Err(DeliveryError::ChannelClosed)
    );
}

// ---------------------------------------------------------------------------
// Test: ping_all pings live sessions and drops closed ones
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_all_drops_closed_channels() {
    let gateway = gateway();
    let mut rx_live = gateway.on_connect("live".to_string()).await.unwrap();
    let rx_dead = gateway.on_connect("dead".to_string()).await.unwrap();
    drop(rx_dead);

    let dropped = gateway.ping_all().await;

    assert_eq!(dropped, 1);
    assert_eq!(gateway.connection_count().await, 1);
    assert!(gateway.registry().get("dead").unwrap().is_none());
    let msg = rx_live.recv().await.unwrap();
    assert!(matches!(msg, Message::Ping(_)));
}

// ---------------------------------------------------------------------------
// Test: the heartbeat task prunes closed sessions on its own
// ---------------------------------------------------------------------------

#[tokio::test]
async fn heartbeat_task_prunes_closed_sessions() {
    let gateway = Arc::new(gateway());
    let _rx_live = gateway.on_connect("live".to_string()).await.unwrap();
    let rx_dead = gateway.on_connect("dead".to_string()).await.unwrap();
    drop(rx_dead);

    let handle = start_heartbeat(Arc::clone(&gateway), Duration::from_millis(10));
    for _ in 0..100 {
        if gateway.connection_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();

    assert_eq!(gateway.connection_count().await, 1);
    assert!(gateway.registry().get("dead").unwrap().is_none());
    assert!(gateway.registry().get("live").unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Test: shutdown_all sends Close and clears all connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let gateway = gateway();
    gateway.mark_initialized();
    let mut rx1 = gateway.on_connect("conn-1".to_string()).await.unwrap();
    let mut rx2 = gateway.on_connect("conn-2".to_string()).await.unwrap();

    gateway.shutdown_all().await;

    assert_eq!(gateway.connection_count().await, 0);
    assert_eq!(gateway.registry().active_count().unwrap(), 0);
    assert!(!gateway.is_initialized());

    for rx in [&mut rx1, &mut rx2] {
        let msg = rx.recv().await.expect("rx should receive Close");
        assert!(
            matches!(msg, Message::Close(None)),
            "Expected Close(None), got: {msg:?}"
        );
        assert!(rx.recv().await.is_none(), "Channel should be closed after shutdown");
    }
}
