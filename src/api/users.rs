// User administration HTTP handlers
// Minimal surface: the engine needs user records for supervisor routing and
// display-name enrichment; full user administration lives upstream

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

use crate::api::types::{error_to_response, json_response, CreateUserRequest};
use crate::api::ApiState;
use crate::models::{AuthUser, User};
use crate::LabError;

/// Create a user record (admin/lab-manager only)
/// POST /users
pub async fn create_user(
    State(state): State<ApiState>,
    caller: AuthUser,
    Json(request): Json<CreateUserRequest>,
) -> impl IntoResponse {
    if !caller.role.can_review_any() {
        return error_to_response(&LabError::Forbidden(
            "an administrative role is required to manage users".to_string(),
        ));
    }
    if request.name.trim().is_empty() || request.email.trim().is_empty() {
        return error_to_response(&LabError::InvalidInput(
            "name and email must not be empty".to_string(),
        ));
    }

    let mut user = User::new(request.name.trim(), request.email.trim(), request.role);
    user.supervisor_id = request.supervisor_id;

    match state.store.create_user(user).await {
        Ok(user) => {
            info!("👤 user {} ({}) created by {}", user.id, user.role, caller.id);
            json_response(StatusCode::CREATED, &user)
        }
        Err(e) => error_to_response(&e),
    }
}

/// List user records (admin/lab-manager only)
/// GET /users
pub async fn list_users(State(state): State<ApiState>, caller: AuthUser) -> impl IntoResponse {
    if !caller.role.can_review_any() {
        return error_to_response(&LabError::Forbidden(
            "an administrative role is required to manage users".to_string(),
        ));
    }
    match state.store.list_users().await {
        Ok(users) => {
            let total = users.len();
            json_response(StatusCode::OK, &json!({ "users": users, "total": total }))
        }
        Err(e) => error_to_response(&e),
    }
}
