// Event envelopes and notification fan-out

//! # Event System
//!
//! Every successful state transition announces itself twice:
//!
//! - a **durable notification** written to the store before anything else,
//!   addressed to the one user who needs to act on or know about the outcome
//! - a **transient event** pushed to currently-connected listeners through
//!   the [`ConnectionManager`]
//!
//! The ordering is deliberate (persist, then push): the push step is allowed
//! to fail independently without rolling back or blocking the transition,
//! which has already been committed by the time the [`Notifier`] runs.
//! Delivery failures are logged and swallowed; they never surface as
//! request-level errors.
//!
//! Addressing modes: one user, an entire lab (the supervisor plus every
//! student assigned to them), or a global broadcast. The workflow engine
//! only ever uses the first two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{Notification, NotificationKind, ResearchLog};
use crate::realtime::ConnectionManager;
use crate::store::LabStore;

/// Tag of a transient event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LogSubmitted,
    LogReturned,
    LogAccepted,
    LogDeclined,
    /// Reply to a client keep-alive ping
    Pong,
}

impl From<NotificationKind> for EventKind {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::LogSubmitted => EventKind::LogSubmitted,
            NotificationKind::LogReturned => EventKind::LogReturned,
            NotificationKind::LogAccepted => EventKind::LogAccepted,
            NotificationKind::LogDeclined => EventKind::LogDeclined,
        }
    }
}

/// The envelope pushed to connected clients: `{ type, data, timestamp }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl LabEvent {
    pub fn new(kind: EventKind, data: serde_json::Value) -> Self {
        LabEvent {
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Event announcing a submission, carrying the acting student's name
    pub fn log_submitted(log: &ResearchLog, actor_name: &str) -> Self {
        LabEvent::new(
            EventKind::LogSubmitted,
            json!({
                "log_id": log.id,
                "title": log.title,
                "status": log.status,
                "actor": actor_name,
                "comment": null,
            }),
        )
    }

    /// Event announcing a review outcome, carrying the reviewer's comment
    pub fn log_reviewed(
        log: &ResearchLog,
        kind: NotificationKind,
        actor_name: &str,
        comment: &str,
    ) -> Self {
        LabEvent::new(
            EventKind::from(kind),
            json!({
                "log_id": log.id,
                "title": log.title,
                "status": log.status,
                "actor": actor_name,
                "comment": comment,
            }),
        )
    }

    pub fn pong() -> Self {
        LabEvent::new(EventKind::Pong, json!({}))
    }
}

/// Persist-then-push notification fan-out
///
/// Owns the store handle for durable records and lab resolution, and the
/// connection manager for the transient push.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn LabStore>,
    connections: Arc<ConnectionManager>,
}

impl Notifier {
    pub fn new(store: Arc<dyn LabStore>, connections: Arc<ConnectionManager>) -> Self {
        Notifier { store, connections }
    }

    /// Fan-out for a successful submit: durable record to the supervisor
    /// (skipped when student and supervisor are the same identity), then a
    /// push to both participants' channels.
    pub async fn log_submitted(&self, log: &ResearchLog, student_name: &str) {
        let event = LabEvent::log_submitted(log, student_name);

        if let Some(supervisor_id) = &log.supervisor_id {
            if log.student_id.as_deref() != Some(supervisor_id.as_str()) {
                let notification = Notification::new(
                    supervisor_id.clone(),
                    NotificationKind::LogSubmitted,
                    "Research log submitted",
                    format!("{} submitted \"{}\" for review", student_name, log.title),
                    json!({ "log_id": log.id, "actor": student_name, "comment": null }),
                );
                self.persist(notification).await;
            }
        }

        self.push_to_participants(log, &event);
    }

    /// Fan-out for a review outcome: durable record to the student, then a
    /// push to the log's lab.
    pub async fn log_reviewed(
        &self,
        log: &ResearchLog,
        kind: NotificationKind,
        reviewer_name: &str,
        comment: &str,
    ) {
        let event = LabEvent::log_reviewed(log, kind, reviewer_name, comment);

        if let Some(student_id) = &log.student_id {
            let verb = match kind {
                NotificationKind::LogSubmitted => "submitted",
                NotificationKind::LogReturned => "returned",
                NotificationKind::LogAccepted => "accepted",
                NotificationKind::LogDeclined => "declined",
            };
            let notification = Notification::new(
                student_id.clone(),
                kind,
                format!("Research log {verb}"),
                format!("{} {} \"{}\": {}", reviewer_name, verb, log.title, comment),
                json!({ "log_id": log.id, "actor": reviewer_name, "comment": comment }),
            );
            self.persist(notification).await;
        }

        if let Some(supervisor_id) = &log.supervisor_id {
            self.send_to_lab(supervisor_id, &event).await;
        } else {
            self.push_to_participants(log, &event);
        }
    }

    /// Push to an entire lab: the supervisor plus every student assigned to
    /// them, resolved against the user collection.
    pub async fn send_to_lab(&self, supervisor_id: &str, event: &LabEvent) {
        let mut member_ids = vec![supervisor_id.to_string()];
        match self.store.list_students_of(supervisor_id).await {
            Ok(students) => member_ids.extend(students.into_iter().map(|s| s.id)),
            Err(e) => warn!("could not resolve lab of {}: {}", supervisor_id, e),
        }
        let delivered = self.connections.send_to_users(&member_ids, event);
        debug!(
            "pushed {:?} to lab of {} ({} connections)",
            event.kind, supervisor_id, delivered
        );
    }

    /// Push to every connected client. The workflow engine never uses this;
    /// it exists for lab-wide announcements outside the review workflow.
    pub fn broadcast(&self, event: &LabEvent) {
        let delivered = self.connections.broadcast(event);
        debug!("broadcast {:?} to {} connections", event.kind, delivered);
    }

    fn push_to_participants(&self, log: &ResearchLog, event: &LabEvent) {
        let mut ids: Vec<String> = Vec::new();
        if let Some(student_id) = &log.student_id {
            ids.push(student_id.clone());
        }
        if let Some(supervisor_id) = &log.supervisor_id {
            if !ids.contains(supervisor_id) {
                ids.push(supervisor_id.clone());
            }
        }
        let delivered = self.connections.send_to_users(&ids, event);
        debug!(
            "pushed {:?} to participants of log {} ({} connections)",
            event.kind, log.id, delivered
        );
    }

    async fn persist(&self, notification: Notification) {
        // The transition is already committed; a failed durable write is
        // logged but does not fail the request
        if let Err(e) = self.store.create_notification(notification).await {
            warn!("failed to persist notification: {}", e);
        }
    }
}
