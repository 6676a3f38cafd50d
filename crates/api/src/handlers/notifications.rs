//! Handlers for the `/notifications` resource.
//!
//! Reads and administrative operations go through the
//! [`StatusService`](jobtrack_events::StatusService), which never fails; only
//! malformed send requests produce an error response.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use jobtrack_core::types::Timestamp;
use jobtrack_events::{
    BroadcastReport, ConnectionStats, DeliveryOutcome, HealthStatus, NotificationEvent,
    NotificationPayload,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Response body for `GET /notifications/history`.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Newest first.
    pub notifications: Vec<NotificationEvent>,
    pub timestamp: Timestamp,
}

/// Request body for `POST /notifications/send`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    /// Deliver to this connection only; broadcast when absent.
    pub connection_id: Option<String>,
    #[serde(flatten)]
    pub payload: NotificationPayload,
}

/// Response body for `POST /notifications/send`.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum SendNotificationResponse {
    Broadcast {
        recipients: usize,
        delivered: usize,
        failed: usize,
    },
    Targeted {
        #[serde(rename = "connectionId")]
        connection_id: String,
        outcome: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /notifications/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<ConnectionStats> {
    Json(state.status.connection_stats())
}

/// GET /notifications/health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.status.health_status())
}

/// GET /notifications/history
pub async fn get_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        notifications: state.status.notification_history(),
        timestamp: Utc::now(),
    })
}

/// DELETE /notifications/history
///
/// Returns 204 No Content.
pub async fn clear_history(State(state): State<AppState>) -> StatusCode {
    state.status.clear_notification_history();
    StatusCode::NO_CONTENT
}

/// POST /notifications/send
///
/// Broadcast a notification, or deliver it to one connection when
/// `connectionId` is given. Returns 202 with the delivery result; delivery
/// failures are reported in the body, not as an error status.
pub async fn send_notification(
    State(state): State<AppState>,
    body: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(request) = body?;
    request.payload.validate()?;

    let response = match request.connection_id {
        Some(connection_id) => {
            let outcome = state
                .status
                .send_to_client(&connection_id, request.payload)
                .await;
            SendNotificationResponse::Targeted {
                connection_id,
                outcome: outcome_label(&outcome),
            }
        }
        None => {
            let BroadcastReport {
                recipients,
                delivered,
                failed,
            } = state.status.send_notification(request.payload).await;
            SendNotificationResponse::Broadcast {
                recipients,
                delivered,
                failed,
            }
        }
    };

    Ok((StatusCode::ACCEPTED, Json(response)))
}

fn outcome_label(outcome: &DeliveryOutcome) -> &'static str {
    match outcome {
        DeliveryOutcome::Delivered => "delivered",
        DeliveryOutcome::NotFound => "not_found",
        DeliveryOutcome::Rejected => "rejected",
        DeliveryOutcome::Failed(_) => "failed",
    }
}
