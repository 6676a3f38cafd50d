use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::ws::gateway::WsGateway;

/// Spawn the heartbeat task: every `interval`, ping each session and
/// unregister the ones whose outbound channel has closed.
///
/// Runs until aborted during shutdown.
pub fn start_heartbeat(gateway: Arc<WsGateway>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + interval, interval);
        // No catch-up bursts after a stalled tick.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let dropped = gateway.ping_all().await;
            let live = gateway.connection_count().await;
            if dropped > 0 {
                tracing::info!(live, dropped, "Heartbeat pruned closed WebSocket sessions");
            } else {
                tracing::debug!(live, "WebSocket heartbeat ping");
            }
        }
    })
}
