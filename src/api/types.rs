// Request/response types for the REST surface

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::UserRole;
use crate::LabError;

/// Body of the review endpoints. `return` requires a comment; `accept` and
/// `decline` fall back to a default message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRequest {
    pub comment: Option<String>,
}

/// Body of `POST /users`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub supervisor_id: Option<String>,
}

/// Map an engine error onto its HTTP status and a JSON error body.
///
/// The mapping is the spec's taxonomy: NotFound is 404, Forbidden 403,
/// everything the caller can fix (invalid transition, missing routing, bad
/// input) is 400, and the rest is a 500.
pub fn error_to_response(err: &LabError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        LabError::NotFound(_) => StatusCode::NOT_FOUND,
        LabError::Forbidden(_) => StatusCode::FORBIDDEN,
        LabError::InvalidTransition { .. }
        | LabError::MissingRouting(_)
        | LabError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LabError::Storage(_) | LabError::Serialization(_) | LabError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() })))
}

/// Serialize a response payload, falling back to an error body rather than
/// panicking if serialization fails
pub fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> (StatusCode, Json<serde_json::Value>) {
    match serde_json::to_value(payload) {
        Ok(value) => (status, Json(value)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Failed to serialize response: {e}") })),
        ),
    }
}
