pub mod health;
pub mod notifications;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the application route tree (health is mounted separately).
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket (real-time notifications)
///
/// /notifications/stats                 connection stats (GET)
/// /notifications/health                relay health (GET)
/// /notifications/history               recent notifications (GET), clear (DELETE)
/// /notifications/send                  broadcast or target one connection (POST)
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/notifications", notifications::router())
}
