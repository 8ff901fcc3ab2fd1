// Research log HTTP handlers
// Thin translation from HTTP verbs/bodies into workflow engine calls

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::api::types::{error_to_response, json_response, ReviewRequest};
use crate::api::ApiState;
use crate::models::{AuthUser, LogPatch, NewLog};

/// Create a log in DRAFT (or submit immediately when the payload asks)
/// POST /research-logs
pub async fn create_log(
    State(state): State<ApiState>,
    caller: AuthUser,
    Json(request): Json<NewLog>,
) -> impl IntoResponse {
    info!("📝 POST /research-logs by {}", caller.id);
    match state.engine.create_log(&caller, request).await {
        Ok(log) => json_response(StatusCode::CREATED, &log),
        Err(e) => {
            warn!("create_log failed for {}: {}", caller.id, e);
            error_to_response(&e)
        }
    }
}

/// Role-filtered listing, enriched with student display fields
/// GET /research-logs
pub async fn list_logs(State(state): State<ApiState>, caller: AuthUser) -> impl IntoResponse {
    match state.engine.list_logs(&caller).await {
        Ok(views) => {
            let total = views.len();
            json_response(StatusCode::OK, &json!({ "logs": views, "total": total }))
        }
        Err(e) => error_to_response(&e),
    }
}

/// Student-only condensed status view
/// GET /research-logs/student/status
pub async fn student_status(State(state): State<ApiState>, caller: AuthUser) -> impl IntoResponse {
    match state.engine.student_status(&caller).await {
        Ok(rows) => {
            let total = rows.len();
            json_response(StatusCode::OK, &json!({ "logs": rows, "total": total }))
        }
        Err(e) => error_to_response(&e),
    }
}

/// GET /research-logs/:id
pub async fn get_log(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    caller: AuthUser,
) -> impl IntoResponse {
    match state.engine.get_log(&caller, &id).await {
        Ok(log) => json_response(StatusCode::OK, &log),
        Err(e) => error_to_response(&e),
    }
}

/// Patch a draft or returned log (author only)
/// PUT /research-logs/:id
pub async fn update_log(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    caller: AuthUser,
    Json(patch): Json<LogPatch>,
) -> impl IntoResponse {
    match state.engine.update_log(&caller, &id, patch).await {
        Ok(log) => json_response(StatusCode::OK, &log),
        Err(e) => {
            warn!("update_log {} failed for {}: {}", id, caller.id, e);
            error_to_response(&e)
        }
    }
}

/// Submit a log for review. Idempotent: a duplicate submit returns the
/// unchanged record with 200, never an error.
/// POST /research-logs/:id/submit
pub async fn submit_log(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    caller: AuthUser,
) -> impl IntoResponse {
    info!("🚀 POST /research-logs/{}/submit by {}", id, caller.id);
    match state.engine.submit(&caller, &id).await {
        Ok(outcome) => json_response(StatusCode::OK, outcome.log()),
        Err(e) => {
            warn!("submit {} failed for {}: {}", id, caller.id, e);
            error_to_response(&e)
        }
    }
}

/// Return a submitted log for revision; the comment is required
/// POST /research-logs/:id/return
pub async fn return_log(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    caller: AuthUser,
    body: Option<Json<ReviewRequest>>,
) -> impl IntoResponse {
    let comment = body.and_then(|Json(r)| r.comment);
    match state.engine.return_log(&caller, &id, comment).await {
        Ok(log) => json_response(StatusCode::OK, &log),
        Err(e) => error_to_response(&e),
    }
}

/// Accept a submitted log (terminal)
/// POST /research-logs/:id/accept
pub async fn accept_log(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    caller: AuthUser,
    body: Option<Json<ReviewRequest>>,
) -> impl IntoResponse {
    let comment = body.and_then(|Json(r)| r.comment);
    match state.engine.accept(&caller, &id, comment).await {
        Ok(log) => json_response(StatusCode::OK, &log),
        Err(e) => error_to_response(&e),
    }
}

/// Decline a submitted log (terminal)
/// POST /research-logs/:id/decline
pub async fn decline_log(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    caller: AuthUser,
    body: Option<Json<ReviewRequest>>,
) -> impl IntoResponse {
    let comment = body.and_then(|Json(r)| r.comment);
    match state.engine.decline(&caller, &id, comment).await {
        Ok(log) => json_response(StatusCode::OK, &log),
        Err(e) => error_to_response(&e),
    }
}

/// Administrative removal, outside the review state machine
/// DELETE /research-logs/:id
pub async fn delete_log(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    caller: AuthUser,
) -> impl IntoResponse {
    match state.engine.delete_log(&caller, &id).await {
        Ok(()) => json_response(StatusCode::OK, &json!({ "deleted": true })),
        Err(e) => error_to_response(&e),
    }
}
