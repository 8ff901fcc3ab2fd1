// Users, roles and resolved caller identity

//! # User Model
//!
//! Lab membership is flat: a **lab** is a supervisor plus every student whose
//! `supervisor_id` references that supervisor. Roles form a closed enum;
//! `LabManager` and `Admin` hold review privileges over any log, a
//! `Supervisor` only over their own lab.
//!
//! Authentication itself is external. By the time a request reaches this
//! crate the caller has been resolved to an [`AuthUser`] by the upstream
//! gateway; the HTTP layer only lifts that identity out of trusted headers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::LabError;

/// Role of a lab member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Supervisor,
    LabManager,
    Admin,
}

impl UserRole {
    /// Administrative roles may review (and delete) any log regardless of
    /// lab membership
    pub fn can_review_any(&self) -> bool {
        matches!(self, UserRole::LabManager | UserRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Supervisor => "supervisor",
            UserRole::LabManager => "lab_manager",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(UserRole::Student),
            "supervisor" => Ok(UserRole::Supervisor),
            "lab_manager" => Ok(UserRole::LabManager),
            "admin" => Ok(UserRole::Admin),
            other => Err(LabError::InvalidInput(format!("unknown role '{other}'"))),
        }
    }
}

/// A lab member as persisted in the user collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// For students: the supervisor their submissions route to
    pub supervisor_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new<N: Into<String>, E: Into<String>>(name: N, email: E, role: UserRole) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            role,
            supervisor_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style helper to attach a supervisor assignment
    pub fn with_supervisor<S: Into<String>>(mut self, supervisor_id: S) -> Self {
        self.supervisor_id = Some(supervisor_id.into());
        self
    }
}

/// The resolved caller identity supplied by the external authentication
/// boundary: `{ id, role, supervisor_id }`
///
/// This is deliberately smaller than [`User`]: it is what the gateway can
/// vouch for on every request, not a full profile. The engine consults the
/// user collection when it needs display names or a stored supervisor
/// assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub role: UserRole,
    pub supervisor_id: Option<String>,
}

impl AuthUser {
    pub fn new<I: Into<String>>(id: I, role: UserRole) -> Self {
        AuthUser {
            id: id.into(),
            role,
            supervisor_id: None,
        }
    }

    pub fn with_supervisor<S: Into<String>>(mut self, supervisor_id: S) -> Self {
        self.supervisor_id = Some(supervisor_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        for role in [
            UserRole::Student,
            UserRole::Supervisor,
            UserRole::LabManager,
            UserRole::Admin,
        ] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
            let wire = serde_json::to_value(role).unwrap();
            assert_eq!(wire, serde_json::json!(role.as_str()));
        }
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_review_privileges() {
        assert!(!UserRole::Student.can_review_any());
        assert!(!UserRole::Supervisor.can_review_any());
        assert!(UserRole::LabManager.can_review_any());
        assert!(UserRole::Admin.can_review_any());
    }

    #[test]
    fn test_user_with_supervisor() {
        let supervisor = User::new("Dr. Ortega", "ortega@lab.example", UserRole::Supervisor);
        let student = User::new("Mina Park", "mina@lab.example", UserRole::Student)
            .with_supervisor(supervisor.id.clone());
        assert_eq!(student.supervisor_id.as_deref(), Some(supervisor.id.as_str()));
    }
}
