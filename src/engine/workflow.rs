// Research log review workflow engine

//! # Review Workflow Engine
//!
//! The core of LabFlow. [`ReviewEngine`] validates and applies state
//! transitions on research logs, enforces who may invoke which transition,
//! guarantees idempotency of `submit`, and triggers the notification
//! fan-out after every successful transition.
//!
//! ## Transition contract
//!
//! Every handler follows the same shape:
//!
//! 1. load the log by id ("not found" if absent)
//! 2. authorize the caller (owning student for `submit`; the assigned
//!    supervisor or an administrative role for review actions)
//! 3. validate the requested transition against the status table
//! 4. apply the state-specific field updates
//! 5. persist, then fan out notifications
//!
//! The three review actions (`return` / `accept` / `decline`) share one
//! internal handler parameterized by [`ReviewAction`]: every review produces
//! exactly one of three outcomes, fully determined by the current state, the
//! requested action and the caller identity.
//!
//! ## Idempotency
//!
//! Submitting an already-`SUBMITTED` log is a defined success path that
//! returns the unchanged record and produces no side effect, so duplicate
//! client retries never surface as errors or duplicate notifications.
//!
//! ## Concurrency
//!
//! The engine is request-scoped and stateless between calls: each handler
//! is a single read-modify-write with no long-held locks. There is no
//! compare-and-swap on `status`; see the store module notes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::engine::events::Notifier;
use crate::models::{
    AuthUser, LogPatch, LogStatus, NewLog, Notification, NotificationKind, ResearchLog, User,
    UserRole,
};
use crate::store::LabStore;
use crate::{LabError, Result};

/// Review comment used when an accept carries none
const DEFAULT_ACCEPT_COMMENT: &str = "Accepted. Good work.";
/// Review comment used when a decline carries none
const DEFAULT_DECLINE_COMMENT: &str = "Declined. Please discuss the feedback with your supervisor.";

/// The three review outcomes a supervisor can apply to a submitted log
#[derive(Debug, Clone, Copy)]
enum ReviewAction {
    Return,
    Accept,
    Decline,
}

impl ReviewAction {
    fn target(self) -> LogStatus {
        match self {
            ReviewAction::Return => LogStatus::Returned,
            ReviewAction::Accept => LogStatus::Accepted,
            ReviewAction::Decline => LogStatus::Declined,
        }
    }

    fn notification_kind(self) -> NotificationKind {
        match self {
            ReviewAction::Return => NotificationKind::LogReturned,
            ReviewAction::Accept => NotificationKind::LogAccepted,
            ReviewAction::Decline => NotificationKind::LogDeclined,
        }
    }
}

/// Result of a submit call: either a fresh transition or the idempotent
/// short-circuit for a log that was already submitted
#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted(ResearchLog),
    AlreadySubmitted(ResearchLog),
}

impl SubmitOutcome {
    pub fn log(&self) -> &ResearchLog {
        match self {
            SubmitOutcome::Submitted(log) | SubmitOutcome::AlreadySubmitted(log) => log,
        }
    }

    pub fn into_log(self) -> ResearchLog {
        match self {
            SubmitOutcome::Submitted(log) | SubmitOutcome::AlreadySubmitted(log) => log,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, SubmitOutcome::AlreadySubmitted(_))
    }
}

/// A log row enriched with the authoring student's display fields, as served
/// by the role-based list view
#[derive(Debug, Clone, Serialize)]
pub struct LogView {
    #[serde(flatten)]
    pub log: ResearchLog,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
}

/// Condensed per-log row for the student status view
#[derive(Debug, Clone, Serialize)]
pub struct StudentStatusRow {
    pub id: String,
    pub title: String,
    pub status: LogStatus,
    pub display_status: String,
    pub review_comment: Option<String>,
    pub reviewer_name: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// The workflow engine
pub struct ReviewEngine {
    store: Arc<dyn LabStore>,
    notifier: Notifier,
}

impl ReviewEngine {
    pub fn new(store: Arc<dyn LabStore>, notifier: Notifier) -> Self {
        ReviewEngine { store, notifier }
    }

    /// Create a log in `DRAFT` (or submit it immediately when asked to).
    ///
    /// `student_id` is set from the caller; `supervisor_id` is derived from
    /// the caller's supervisor assignment, falling back to the stored user
    /// profile. A supervisor authoring their own log routes to themselves.
    pub async fn create_log(&self, caller: &AuthUser, input: NewLog) -> Result<ResearchLog> {
        if input.title.trim().is_empty() {
            return Err(LabError::InvalidInput("title must not be empty".to_string()));
        }

        let mut log = ResearchLog::new(caller.id.as_str(), input.title.trim());
        log.description = input.description;
        log.activity_type = input.activity_type;
        log.duration_minutes = input.duration_minutes;
        log.findings = input.findings;
        log.challenges = input.challenges;
        log.next_steps = input.next_steps;
        log.tags = input.tags;
        log.attachments = input.attachments;
        log.student_id = Some(caller.id.clone());
        log.supervisor_id = self.resolve_supervisor(caller).await?;

        let log = self.store.create_log(log).await?;
        info!("📓 research log {} created by {}", log.id, caller.id);

        if input.submit {
            return Ok(self.submit(caller, &log.id).await?.into_log());
        }
        Ok(log)
    }

    /// Fetch one log, visible to its author, its student, its supervisor,
    /// and administrative roles
    pub async fn get_log(&self, caller: &AuthUser, id: &str) -> Result<ResearchLog> {
        let log = self.load(id).await?;
        let visible = caller.role.can_review_any()
            || log.author_id == caller.id
            || log.student_id.as_deref() == Some(caller.id.as_str())
            || log.supervisor_id.as_deref() == Some(caller.id.as_str());
        if !visible {
            return Err(LabError::Forbidden(
                "you do not have access to this research log".to_string(),
            ));
        }
        Ok(log)
    }

    /// Patch the descriptive payload of a draft or returned log
    pub async fn update_log(
        &self,
        caller: &AuthUser,
        id: &str,
        patch: LogPatch,
    ) -> Result<ResearchLog> {
        let mut log = self.load(id).await?;
        let is_owner = log.author_id == caller.id
            || log.student_id.as_deref() == Some(caller.id.as_str());
        if !is_owner {
            return Err(LabError::Forbidden(
                "only the owning student may edit this log".to_string(),
            ));
        }
        if !log.status.is_editable() {
            return Err(LabError::InvalidInput(format!(
                "research log is {}; only draft or returned logs can be edited",
                log.status
            )));
        }
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(LabError::InvalidInput("title must not be empty".to_string()));
            }
        }
        log.apply_patch(patch);
        self.store.update_log(log).await
    }

    /// Submit a log for review.
    ///
    /// Idempotent: submitting an already-`SUBMITTED` log succeeds trivially
    /// and returns the unchanged record. Terminal logs cannot be
    /// resubmitted. Missing `student_id`/`supervisor_id` are backfilled from
    /// the caller before the transition; a student with no resolvable
    /// supervisor fails with a routing error and nothing is persisted.
    pub async fn submit(&self, caller: &AuthUser, id: &str) -> Result<SubmitOutcome> {
        let mut log = self.load(id).await?;

        let is_owner = log.student_id.as_deref() == Some(caller.id.as_str())
            || log.author_id == caller.id;
        if !is_owner {
            return Err(LabError::Forbidden(
                "only the owning student may submit this log".to_string(),
            ));
        }
        if log.student_id.is_none() {
            // Legacy record: the caller is the implicit student
            log.student_id = Some(caller.id.clone());
        }

        if log.status == LogStatus::Submitted {
            info!("research log {} already submitted, idempotent success", log.id);
            return Ok(SubmitOutcome::AlreadySubmitted(log));
        }
        if !log.status.can_transition_to(LogStatus::Submitted) {
            return Err(LabError::InvalidTransition {
                current: log.status,
                requested: LogStatus::Submitted,
            });
        }

        if log.supervisor_id.is_none() {
            log.supervisor_id = self.resolve_supervisor(caller).await?;
        }
        if log.supervisor_id.is_none() {
            return Err(LabError::MissingRouting(format!(
                "student {} has no assigned supervisor",
                caller.id
            )));
        }

        log.mark_submitted(Utc::now());
        let log = self.store.update_log(log).await?;

        // Fan-out only after the transition is committed
        let student_name = self.display_name(&caller.id).await;
        self.notifier.log_submitted(&log, &student_name).await;

        info!("✅ research log {} submitted by {}", log.id, caller.id);
        Ok(SubmitOutcome::Submitted(log))
    }

    /// Return a submitted log to the student for revision. A comment is
    /// required: the student needs actionable feedback to revise.
    pub async fn return_log(
        &self,
        caller: &AuthUser,
        id: &str,
        comment: Option<String>,
    ) -> Result<ResearchLog> {
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                LabError::InvalidInput("a comment is required when returning a log".to_string())
            })?;
        self.review(caller, id, ReviewAction::Return, comment).await
    }

    /// Accept a submitted log (terminal)
    pub async fn accept(
        &self,
        caller: &AuthUser,
        id: &str,
        comment: Option<String>,
    ) -> Result<ResearchLog> {
        let comment = non_empty(comment).unwrap_or_else(|| DEFAULT_ACCEPT_COMMENT.to_string());
        self.review(caller, id, ReviewAction::Accept, comment).await
    }

    /// Decline a submitted log (terminal)
    pub async fn decline(
        &self,
        caller: &AuthUser,
        id: &str,
        comment: Option<String>,
    ) -> Result<ResearchLog> {
        let comment = non_empty(comment).unwrap_or_else(|| DEFAULT_DECLINE_COMMENT.to_string());
        self.review(caller, id, ReviewAction::Decline, comment).await
    }

    /// Shared contract for the three review transitions
    async fn review(
        &self,
        caller: &AuthUser,
        id: &str,
        action: ReviewAction,
        comment: String,
    ) -> Result<ResearchLog> {
        let mut log = self.load(id).await?;

        let authorized = caller.role.can_review_any()
            || log.supervisor_id.as_deref() == Some(caller.id.as_str());
        if !authorized {
            return Err(LabError::Forbidden(
                "only the assigned supervisor or an administrator may review this log"
                    .to_string(),
            ));
        }

        let target = action.target();
        if !log.status.can_transition_to(target) {
            return Err(LabError::InvalidTransition {
                current: log.status,
                requested: target,
            });
        }

        let reviewer_name = self.display_name(&caller.id).await;
        log.apply_review(
            target,
            caller.id.as_str(),
            reviewer_name.as_str(),
            comment.as_str(),
            Utc::now(),
        );
        let log = self.store.update_log(log).await?;

        self.notifier
            .log_reviewed(&log, action.notification_kind(), &reviewer_name, &comment)
            .await;

        info!(
            "✅ research log {} moved to {} by {}",
            log.id, log.status, caller.id
        );
        Ok(log)
    }

    /// Role-filtered listing.
    ///
    /// Students see their own logs. A supervisor sees the logs of every
    /// student in their lab plus their own authored logs. Administrative
    /// roles see everything. All rows are enriched with the student's
    /// display name and email.
    pub async fn list_logs(&self, caller: &AuthUser) -> Result<Vec<LogView>> {
        let logs = match caller.role {
            UserRole::Student => self.store.list_logs_by_student(&caller.id).await?,
            UserRole::Supervisor => {
                let students = self.store.list_students_of(&caller.id).await?;
                let student_ids: Vec<String> = students.into_iter().map(|s| s.id).collect();
                let mut logs = self.store.list_logs_by_students(&student_ids).await?;
                for own in self.store.list_logs_by_author(&caller.id).await? {
                    if !logs.iter().any(|l| l.id == own.id) {
                        logs.push(own);
                    }
                }
                logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                logs
            }
            UserRole::LabManager | UserRole::Admin => self.store.list_logs().await?,
        };
        self.enrich(logs).await
    }

    /// Student-only condensed status rows for self-tracking
    pub async fn student_status(&self, caller: &AuthUser) -> Result<Vec<StudentStatusRow>> {
        if caller.role != UserRole::Student {
            return Err(LabError::Forbidden(
                "the status view is only available to students".to_string(),
            ));
        }
        let logs = self.store.list_logs_by_student(&caller.id).await?;
        Ok(logs
            .into_iter()
            .map(|log| StudentStatusRow {
                id: log.id,
                title: log.title,
                status: log.status,
                display_status: log.status.display_label().to_string(),
                review_comment: log.review_comment,
                reviewer_name: log.reviewer_name,
                submitted_at: log.submitted_at,
                reviewed_at: log.reviewed_at,
            })
            .collect())
    }

    /// Remove a log. An administrative operation outside the state machine;
    /// the workflow itself never hard-deletes.
    pub async fn delete_log(&self, caller: &AuthUser, id: &str) -> Result<()> {
        if !caller.role.can_review_any() {
            return Err(LabError::Forbidden(
                "an administrative role is required to delete research logs".to_string(),
            ));
        }
        if !self.store.delete_log(id).await? {
            return Err(LabError::NotFound(format!("research log {id} not found")));
        }
        info!("🗑️  research log {} deleted by {}", id, caller.id);
        Ok(())
    }

    /// Durable notifications addressed to the caller
    pub async fn notifications_for(&self, caller: &AuthUser) -> Result<Vec<Notification>> {
        self.store.list_notifications_for(&caller.id).await
    }

    /// Mark one of the caller's notifications as read
    pub async fn mark_notification_read(&self, caller: &AuthUser, id: &str) -> Result<()> {
        if !self.store.mark_notification_read(id, &caller.id).await? {
            return Err(LabError::NotFound(format!("notification {id} not found")));
        }
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<ResearchLog> {
        self.store
            .get_log(id)
            .await?
            .ok_or_else(|| LabError::NotFound(format!("research log {id} not found")))
    }

    /// Who should review this caller's submissions. Non-students route to
    /// themselves; students route to their assigned supervisor, from the
    /// auth context first, then the stored profile.
    async fn resolve_supervisor(&self, caller: &AuthUser) -> Result<Option<String>> {
        if caller.role != UserRole::Student {
            return Ok(Some(caller.id.clone()));
        }
        if let Some(supervisor_id) = &caller.supervisor_id {
            return Ok(Some(supervisor_id.clone()));
        }
        Ok(self
            .store
            .get_user(&caller.id)
            .await?
            .and_then(|user| user.supervisor_id))
    }

    async fn display_name(&self, user_id: &str) -> String {
        match self.store.get_user(user_id).await {
            Ok(Some(user)) => user.name,
            _ => user_id.to_string(),
        }
    }

    async fn enrich(&self, logs: Vec<ResearchLog>) -> Result<Vec<LogView>> {
        let mut users: HashMap<String, User> = HashMap::new();
        let mut views = Vec::with_capacity(logs.len());
        for log in logs {
            if let Some(student_id) = log.student_id.clone() {
                if !users.contains_key(&student_id) {
                    if let Some(user) = self.store.get_user(&student_id).await? {
                        users.insert(student_id.clone(), user);
                    }
                }
            }
            let student = log.student_id.as_ref().and_then(|id| users.get(id));
            views.push(LogView {
                student_name: student.map(|u| u.name.clone()),
                student_email: student.map(|u| u.email.clone()),
                log,
            });
        }
        Ok(views)
    }
}

fn non_empty(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}
