use std::sync::Arc;

use jobtrack_events::{ConnectionRegistry, HistoryBuffer, NotificationRelay, StatusService};

use crate::config::ServerConfig;
use crate::ws::WsGateway;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket gateway (browser clients); the relay's transport.
    pub gateway: Arc<WsGateway>,
    /// Notification facade used by handlers and workflow activities.
    pub status: Arc<StatusService>,
}

impl AppState {
    /// Wire the registry, history buffer, gateway and relay together.
    ///
    /// This is the only place the shared relay state is constructed.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let history = Arc::new(HistoryBuffer::new(config.history_capacity));
        let gateway = Arc::new(WsGateway::new(
            Arc::clone(&registry),
            config.ws_channel_capacity,
        ));

        let relay = NotificationRelay::new(registry, history, gateway.clone())
            .with_send_timeout(config.send_timeout());
        let status = Arc::new(StatusService::new(relay));

        Self {
            config: Arc::new(config),
            gateway,
            status,
        }
    }
}
