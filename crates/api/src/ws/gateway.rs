use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::ws::Message;
use jobtrack_core::error::{CoreError, CoreResult};
use jobtrack_events::{ConnectionRegistry, DeliveryError, Transport};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing frames to a WebSocket connection.
pub type WsSender = mpsc::Sender<Message>;

/// Owns the outbound channel of every WebSocket session and keeps the
/// [`ConnectionRegistry`] in step with connects and disconnects.
///
/// Implements [`Transport`] for the notification relay. Channels are bounded,
/// so a client that stops reading makes sends wait until the relay's send
/// timeout fires.
pub struct WsGateway {
    registry: Arc<ConnectionRegistry>,
    senders: RwLock<HashMap<String, WsSender>>,
    channel_capacity: usize,
    initialized: AtomicBool,
}

impl WsGateway {
    pub fn new(registry: Arc<ConnectionRegistry>, channel_capacity: usize) -> Self {
        Self {
            registry,
            senders: RwLock::new(HashMap::new()),
            channel_capacity: channel_capacity.max(1),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Mark the transport as accepting connections.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    /// Register a new session.
    ///
    /// Returns the receiver half of the outbound channel so the caller can
    /// forward frames to the WebSocket sink. An id that is already live is
    /// rejected and the existing session is left untouched.
    pub async fn on_connect(&self, conn_id: String) -> CoreResult<mpsc::Receiver<Message>> {
        let mut senders = self.senders.write().await;
        if senders.contains_key(&conn_id) {
            return Err(CoreError::DuplicateConnection(conn_id));
        }

        self.registry.register(conn_id.clone())?;

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        senders.insert(conn_id, tx);
        Ok(rx)
    }

    /// Forget a session. Unknown ids are ignored.
    pub async fn on_disconnect(&self, conn_id: &str) {
        self.senders.write().await.remove(conn_id);
        if let Err(e) = self.registry.unregister(conn_id) {
            tracing::error!(conn_id = %conn_id, error = %e, "Failed to unregister connection");
        }
    }

    /// Return the current number of open sessions.
    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }

    /// Send a Ping frame to every session.
    ///
    /// Sessions whose channel has closed are disconnected; a full channel is
    /// left alone since the client is still draining it. Returns the number
    /// of sessions dropped.
    pub async fn ping_all(&self) -> usize {
        let closed: Vec<String> = {
            let senders = self.senders.read().await;
            senders
                .iter()
                .filter_map(|(id, tx)| match tx.try_send(Message::Ping(Bytes::new())) {
                    Err(TrySendError::Closed(_)) => Some(id.clone()),
                    _ => None,
                })
                .collect()
        };

        for id in &closed {
            tracing::info!(conn_id = %id, "Dropping WebSocket with closed channel");
            self.on_disconnect(id).await;
        }
        closed.len()
    }

    /// Send a Close frame to every session, then forget them all.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops.
    pub async fn shutdown_all(&self) {
        self.initialized.store(false, Ordering::Release);

        let mut senders = self.senders.write().await;
        let count = senders.len();
        for (id, tx) in senders.drain() {
            let _ = tx.try_send(Message::Close(None));
            if let Err(e) = self.registry.unregister(&id) {
                tracing::error!(conn_id = %id, error = %e, "Failed to unregister connection");
            }
        }
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

#[async_trait]
impl Transport for WsGateway {
    async fn send(&self, connection_id: &str, frame: &str) -> Result<(), DeliveryError> {
        let sender = self
            .senders
            .read()
            .await
            .get(connection_id)
            .cloned()
            .ok_or(DeliveryError::UnknownConnection)?;

        sender
            .send(Message::Text(frame.to_owned().into()))
            .await
            .map_err(|_| DeliveryError::ChannelClosed)
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}
