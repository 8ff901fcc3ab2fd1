// REST + WebSocket endpoint layer
// Thin handlers translating HTTP verbs/bodies into workflow engine calls

pub mod logs;
pub mod middleware;
pub mod notifications;
pub mod types;
pub mod users;
pub mod ws;

#[cfg(test)]
mod handlers_tests;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::engine::workflow::ReviewEngine;
use crate::realtime::ConnectionManager;
use crate::store::LabStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<ReviewEngine>,
    pub store: Arc<dyn LabStore>,
    pub connections: Arc<ConnectionManager>,
}

/// Build the full application router.
///
/// Every route except `/health` requires a resolved caller identity; the
/// `AuthUser` extractor rejects requests without one before any handler
/// runs.
pub fn create_router(state: ApiState, cors_enabled: bool) -> Router {
    let router = Router::new()
        // research log workflow
        .route(
            "/research-logs",
            post(logs::create_log).get(logs::list_logs),
        )
        .route("/research-logs/student/status", get(logs::student_status))
        .route(
            "/research-logs/:id",
            get(logs::get_log)
                .put(logs::update_log)
                .delete(logs::delete_log),
        )
        .route("/research-logs/:id/submit", post(logs::submit_log))
        .route("/research-logs/:id/return", post(logs::return_log))
        .route("/research-logs/:id/accept", post(logs::accept_log))
        .route("/research-logs/:id/decline", post(logs::decline_log))
        // durable notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/:id/read", post(notifications::mark_read))
        // user administration
        .route("/users", post(users::create_user).get(users::list_users))
        // real-time push
        .route("/ws", get(ws::ws_handler))
        // liveness
        .route("/health", get(health_check))
        .with_state(state);

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Liveness probe
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
