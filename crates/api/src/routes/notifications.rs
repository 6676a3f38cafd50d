//! Route definitions for the `/notifications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /stats      -> get_stats
/// GET    /health     -> get_health
/// GET    /history    -> get_history
/// DELETE /history    -> clear_history
/// POST   /send       -> send_notification
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(notifications::get_stats))
        .route("/health", get(notifications::get_health))
        .route(
            "/history",
            get(notifications::get_history).delete(notifications::clear_history),
        )
        .route("/send", post(notifications::send_notification))
}
