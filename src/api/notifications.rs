// Durable notification HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::api::types::{error_to_response, json_response};
use crate::api::ApiState;
use crate::models::AuthUser;

/// Durable notifications addressed to the caller, unread first
/// GET /notifications
pub async fn list_notifications(
    State(state): State<ApiState>,
    caller: AuthUser,
) -> impl IntoResponse {
    match state.engine.notifications_for(&caller).await {
        Ok(notifications) => {
            let unread = notifications.iter().filter(|n| !n.read).count();
            json_response(
                StatusCode::OK,
                &json!({ "notifications": notifications, "unread": unread }),
            )
        }
        Err(e) => error_to_response(&e),
    }
}

/// Mark one notification as read (addressee only)
/// POST /notifications/:id/read
pub async fn mark_read(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    caller: AuthUser,
) -> impl IntoResponse {
    match state.engine.mark_notification_read(&caller, &id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "read": true }))),
        Err(e) => error_to_response(&e),
    }
}
