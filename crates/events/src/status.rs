//! Status facade: the single entry point for workflow activities and HTTP
//! handlers.
//!
//! Every method here is infallible from the caller's point of view. Internal
//! faults are logged and converted to a safe default (empty history, zeroed
//! stats, `unhealthy`), so transport trouble can never make a workflow step
//! fail and retry.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use jobtrack_core::error::CoreResult;
use jobtrack_core::types::Timestamp;
use serde::Serialize;

use crate::event::{NotificationEvent, NotificationPayload};
use crate::history::HistoryBuffer;
use crate::registry::{ConnectionRegistry, ConnectionStats};
use crate::relay::{BroadcastReport, DeliveryOutcome, NotificationRelay};
use crate::workflow::NotificationSink;

/// Overall health reported by [`StatusService::health_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// Composite health of the relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: HealthState,
    pub timestamp: Timestamp,
    /// Live connection count.
    pub connections: usize,
    /// Seconds since the service was constructed.
    pub uptime: f64,
    /// Whether the real-time transport is accepting connections.
    pub server_initialized: bool,
}

impl HealthStatus {
    fn unhealthy() -> Self {
        Self {
            status: HealthState::Unhealthy,
            timestamp: Utc::now(),
            connections: 0,
            uptime: 0.0,
            server_initialized: false,
        }
    }
}

pub struct StatusService {
    relay: NotificationRelay,
    started_at: Instant,
}

impl StatusService {
    pub fn new(relay: NotificationRelay) -> Self {
        Self {
            relay,
            started_at: Instant::now(),
        }
    }

    fn registry(&self) -> &ConnectionRegistry {
        self.relay.registry()
    }

    fn history(&self) -> &HistoryBuffer {
        self.relay.history()
    }

    /// Stamp `payload` and broadcast it to every live connection.
    ///
    /// Invalid payloads are logged and dropped.
    pub async fn send_notification(&self, payload: NotificationPayload) -> BroadcastReport {
        let Some(event) = self.accept(payload) else {
            return BroadcastReport::default();
        };
        self.relay.broadcast(event).await
    }

    /// Stamp `payload` and deliver it to one connection.
    ///
    /// Invalid payloads are logged and reported as [`DeliveryOutcome::Rejected`].
    pub async fn send_to_client(
        &self,
        connection_id: &str,
        payload: NotificationPayload,
    ) -> DeliveryOutcome {
        let Some(event) = self.accept(payload) else {
            return DeliveryOutcome::Rejected;
        };
        let outcome = self.relay.send_to_one(connection_id, event).await;
        if let DeliveryOutcome::Failed(e) = &outcome {
            tracing::warn!(conn_id = %connection_id, error = %e, "Targeted notification not delivered");
        }
        outcome
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        absorb("read connection stats", self.registry().stats())
    }

    /// Recent notifications, newest first.
    pub fn notification_history(&self) -> Vec<NotificationEvent> {
        absorb("read notification history", self.history().snapshot())
    }

    pub fn clear_notification_history(&self) {
        match self.history().clear() {
            Ok(()) => tracing::info!("Notification history cleared"),
            Err(e) => tracing::error!(error = %e, "Failed to clear notification history"),
        }
    }

    /// Composite health. Calls made before the transport is initialized
    /// report zero connections rather than failing.
    pub fn health_status(&self) -> HealthStatus {
        match self.registry().active_count() {
            Ok(connections) => HealthStatus {
                status: HealthState::Healthy,
                timestamp: Utc::now(),
                connections,
                uptime: self.started_at.elapsed().as_secs_f64(),
                server_initialized: self.relay.transport().is_initialized(),
            },
            Err(e) => {
                tracing::error!(error = %e, "Health check failed");
                HealthStatus::unhealthy()
            }
        }
    }

    fn accept(&self, payload: NotificationPayload) -> Option<NotificationEvent> {
        if let Err(e) = payload.validate() {
            tracing::warn!(
                error = %e,
                event_type = %payload.event_type,
                "Dropping invalid notification"
            );
            return None;
        }
        Some(payload.into_event(Utc::now()))
    }
}

#[async_trait]
impl NotificationSink for StatusService {
    async fn send_notification(&self, payload: NotificationPayload) {
        StatusService::send_notification(self, payload).await;
    }
}

/// Log an internal fault and fall back to the type's default.
fn absorb<T: Default>(operation: &str, result: CoreResult<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, operation, "Status facade absorbed internal fault");
        T::default()
    })
}
