// Durable notification records

//! # Notification Model
//!
//! The durable half of the fan-out mechanism: a persisted, per-user record
//! with a type tag, human-readable title/message and an opaque payload (log
//! id, actor name, comment). Unlike the transient real-time push, these
//! survive process restarts and are the source of truth for "what happened
//! while I was away". They are listable per user and markable as read
//! individually.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a durable notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LogSubmitted,
    LogReturned,
    LogAccepted,
    LogDeclined,
}

/// A persisted notification addressed to one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    /// The addressee
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Opaque context for the client: log id, actor name, comment
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new<U, T, M>(
        user_id: U,
        kind: NotificationKind,
        title: T,
        message: M,
        payload: serde_json::Value,
    ) -> Self
    where
        U: Into<String>,
        T: Into<String>,
        M: Into<String>,
    {
        Notification {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            payload,
            read: false,
            created_at: Utc::now(),
        }
    }
}
