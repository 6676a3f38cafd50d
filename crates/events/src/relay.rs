//! Fan-out of notifications to live connections.
//!
//! [`NotificationRelay`] records each event in the [`HistoryBuffer`] and then
//! pushes it through the [`Transport`]. A failure on one connection is logged
//! and counted but never stops delivery to the others, and nothing in this
//! module returns an error to its caller.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;

use crate::event::NotificationEvent;
use crate::history::HistoryBuffer;
use crate::registry::{Connection, ConnectionRegistry};
use crate::transport::{DeliveryError, Transport};

/// Upper bound on a single per-connection send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of delivering one event to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The target connection is not registered.
    NotFound,
    /// The payload failed validation and was never sent or recorded.
    Rejected,
    Failed(DeliveryError),
}

/// Summary of one broadcast. Failures are counted, not raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReport {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// NotificationRelay
// ---------------------------------------------------------------------------

pub struct NotificationRelay {
    registry: Arc<ConnectionRegistry>,
    history: Arc<HistoryBuffer>,
    transport: Arc<dyn Transport>,
    send_timeout: Duration,
}

impl NotificationRelay {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        history: Arc<HistoryBuffer>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            registry,
            history,
            transport,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Override the per-connection send bound.
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn history(&self) -> &Arc<HistoryBuffer> {
        &self.history
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Record `event` and push it to every live connection.
    ///
    /// Sends run concurrently across connections; each is bounded by the send
    /// timeout. Returns once every attempt has finished or timed out.
    pub async fn broadcast(&self, event: NotificationEvent) -> BroadcastReport {
        let event = self.record(event);

        let connections = match self.registry.active() {
            Ok(connections) => connections,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list connections for broadcast");
                return BroadcastReport::default();
            }
        };

        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    application_id = %event.application_id,
                    "Failed to encode notification frame"
                );
                return BroadcastReport {
                    recipients: connections.len(),
                    delivered: 0,
                    failed: connections.len(),
                };
            }
        };

        let results = join_all(connections.iter().map(|conn| self.deliver(conn, &frame))).await;

        let delivered = results.iter().filter(|r| r.is_ok()).count();
        let report = BroadcastReport {
            recipients: connections.len(),
            delivered,
            failed: connections.len() - delivered,
        };

        tracing::debug!(
            event_type = %event.event_type,
            application_id = %event.application_id,
            recipients = report.recipients,
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast notification"
        );
        report
    }

    /// Record `event` and push it to a single connection.
    ///
    /// An unknown id is reported as [`DeliveryOutcome::NotFound`].
    pub async fn send_to_one(&self, connection_id: &str, event: NotificationEvent) -> DeliveryOutcome {
        let event = self.record(event);

        let conn = match self.registry.get(connection_id) {
            Ok(Some(conn)) => conn,
            Ok(None) => {
                tracing::debug!(conn_id = %connection_id, "Notification target not connected");
                return DeliveryOutcome::NotFound;
            }
            Err(e) => {
                tracing::error!(error = %e, conn_id = %connection_id, "Failed to look up connection");
                return DeliveryOutcome::NotFound;
            }
        };

        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, conn_id = %connection_id, "Failed to encode notification frame");
                conn.record_failure();
                return DeliveryOutcome::Failed(DeliveryError::Encode(e.to_string()));
            }
        };

        match self.deliver(&conn, &frame).await {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(e) => DeliveryOutcome::Failed(e),
        }
    }

    /// Append to history; a failing buffer never blocks delivery.
    fn record(&self, event: NotificationEvent) -> NotificationEvent {
        match self.history.append(event.clone()) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(error = %e, "Failed to record notification history");
                event
            }
        }
    }

    /// One bounded, serialized send to one connection.
    ///
    /// Failures are logged and counted here. A broken channel also removes
    /// this connection from the registry, unless a newer session has since
    /// taken its id.
    async fn deliver(&self, conn: &Arc<Connection>, frame: &str) -> Result<(), DeliveryError> {
        let result = {
            let _guard = conn.lock_sends().await;
            match tokio::time::timeout(self.send_timeout, self.transport.send(conn.id(), frame)).await {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::TimedOut(self.send_timeout)),
            }
        };

        match &result {
            Ok(()) => conn.record_delivery(),
            Err(e) => {
                conn.record_failure();
                tracing::warn!(conn_id = %conn.id(), error = %e, "Notification delivery failed");
                if e.is_broken_channel() {
                    match self.registry.unregister_connection(conn) {
                        Ok(true) => {
                            tracing::info!(conn_id = %conn.id(), "Dropped connection with broken channel");
                        }
                        Ok(false) => {
                            tracing::debug!(conn_id = %conn.id(), "Broken connection already removed or replaced");
                        }
                        Err(e) => {
                            conn.mark_dead();
                            tracing::error!(
                                conn_id = %conn.id(),
                                error = %e,
                                "Failed to drop broken connection"
                            );
                        }
                    }
                }
            }
        }
        result
    }
}
