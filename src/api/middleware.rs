// Caller identity extraction
// Lifts the identity resolved by the upstream authentication boundary out
// of trusted request headers

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::json;

use crate::models::{AuthUser, UserRole};

/// Header carrying the resolved caller id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the resolved caller role
pub const USER_ROLE_HEADER: &str = "x-user-role";
/// Header carrying the caller's supervisor assignment, when they have one
pub const USER_SUPERVISOR_HEADER: &str = "x-user-supervisor";

/// Extract the authenticated caller from the trusted gateway headers.
///
/// Authentication itself happens upstream; by the time a request reaches
/// this service the gateway has verified the credential and attached
/// `{ id, role, supervisor_id }` as headers. A request without a usable
/// identity is rejected with 401 before any handler runs.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| unauthorized("missing x-user-id header"))?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("missing x-user-role header"))?
            .trim()
            .parse::<UserRole>()
            .map_err(|_| unauthorized("invalid x-user-role header"))?;

        let supervisor_id = parts
            .headers
            .get(USER_SUPERVISOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Ok(AuthUser {
            id: id.to_string(),
            role,
            supervisor_id,
        })
    }
}

fn unauthorized(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message })))
}
