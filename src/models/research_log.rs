// Research log entity - the one record with lifecycle semantics

//! # Research Log Model
//!
//! This module defines the [`ResearchLog`] entity and its status state
//! machine. A log is authored by a student (or by a supervisor for their own
//! work), submitted for review, and either returned for revision or closed
//! with a terminal outcome:
//!
//! ```text
//!     [DRAFT] --submit--> [SUBMITTED] --accept--> [ACCEPTED]
//!        ^                    |    \--decline--> [DECLINED]
//!        |                    |return
//!        +--<--(edit/resubmit)-+--> [RETURNED] --submit--> [SUBMITTED]
//! ```
//!
//! The transition table lives on [`LogStatus`] as exhaustive matches so the
//! compiler checks every (state, action) pair; there are no string-keyed
//! status comparisons anywhere in the crate. The wire format is the
//! SCREAMING_SNAKE_CASE status string, with an explicit, tested mapping in
//! both directions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::LabError;

/// Status of a research log within the review workflow
///
/// `Draft` is the initial state. `Accepted` and `Declined` are terminal:
/// no outbound transition is defined from them, not even `submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogStatus {
    Draft,
    Submitted,
    Returned,
    Accepted,
    Declined,
}

impl LogStatus {
    /// The transition table: which statuses are reachable from this one.
    ///
    /// | Current   | Allowed next                 |
    /// |-----------|------------------------------|
    /// | DRAFT     | SUBMITTED                    |
    /// | SUBMITTED | RETURNED, ACCEPTED, DECLINED |
    /// | RETURNED  | SUBMITTED                    |
    /// | ACCEPTED  | (none)                       |
    /// | DECLINED  | (none)                       |
    pub fn allowed_next(&self) -> &'static [LogStatus] {
        match self {
            LogStatus::Draft => &[LogStatus::Submitted],
            LogStatus::Submitted => &[
                LogStatus::Returned,
                LogStatus::Accepted,
                LogStatus::Declined,
            ],
            LogStatus::Returned => &[LogStatus::Submitted],
            LogStatus::Accepted | LogStatus::Declined => &[],
        }
    }

    /// Check whether a transition to `next` is permitted from this status
    pub fn can_transition_to(&self, next: LogStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Terminal statuses have no outbound transitions
    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    /// A log is editable only before submission or after being returned
    pub fn is_editable(&self) -> bool {
        matches!(self, LogStatus::Draft | LogStatus::Returned)
    }

    /// The wire representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Draft => "DRAFT",
            LogStatus::Submitted => "SUBMITTED",
            LogStatus::Returned => "RETURNED",
            LogStatus::Accepted => "ACCEPTED",
            LogStatus::Declined => "DECLINED",
        }
    }

    /// Human-readable label used by the condensed student status view
    pub fn display_label(&self) -> &'static str {
        match self {
            LogStatus::Draft => "Draft",
            LogStatus::Submitted => "Pending review",
            LogStatus::Returned => "Returned for revision",
            LogStatus::Accepted => "Accepted",
            LogStatus::Declined => "Declined",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogStatus {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(LogStatus::Draft),
            "SUBMITTED" => Ok(LogStatus::Submitted),
            "RETURNED" => Ok(LogStatus::Returned),
            "ACCEPTED" => Ok(LogStatus::Accepted),
            "DECLINED" => Ok(LogStatus::Declined),
            other => Err(LabError::InvalidInput(format!(
                "unknown log status '{other}'"
            ))),
        }
    }
}

/// Kind of research activity a log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Experiment,
    Literature,
    Analysis,
    Writing,
    Meeting,
    Other,
}

/// A student research log
///
/// `student_id` is the student the log is attributed to for review purposes
/// and `supervisor_id` the reviewer it routes to. Both are set at creation
/// and guaranteed non-null by the time the log first reaches `SUBMITTED`;
/// the submit transition backfills either field from the caller's profile to
/// tolerate legacy, partially-populated records.
///
/// Review fields (`reviewed_at`, `reviewer_id`, `reviewer_name`,
/// `review_comment`) serialize as explicit `null` until a supervisor acts,
/// so clients can rely on their presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchLog {
    /// Opaque unique identifier, immutable, assigned at creation
    pub id: String,

    /// The user who created the log
    pub author_id: String,

    /// The student the log is attributed to for review
    pub student_id: Option<String>,

    /// The supervisor responsible for reviewing the log
    pub supervisor_id: Option<String>,

    pub status: LogStatus,

    pub title: String,
    pub description: Option<String>,
    pub activity_type: Option<ActivityKind>,
    pub duration_minutes: Option<u32>,
    pub findings: Option<String>,
    pub challenges: Option<String>,
    pub next_steps: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<String>,

    /// Set on transition into SUBMITTED; overwritten on resubmission
    pub submitted_at: Option<DateTime<Utc>>,

    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewer_id: Option<String>,
    pub reviewer_name: Option<String>,
    pub review_comment: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResearchLog {
    /// Create a new log in `DRAFT` with a generated id
    pub fn new<A: Into<String>, T: Into<String>>(author_id: A, title: T) -> Self {
        let now = Utc::now();
        ResearchLog {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.into(),
            student_id: None,
            supervisor_id: None,
            status: LogStatus::Draft,
            title: title.into(),
            description: None,
            activity_type: None,
            duration_minutes: None,
            findings: None,
            challenges: None,
            next_steps: None,
            tags: Vec::new(),
            attachments: Vec::new(),
            submitted_at: None,
            reviewed_at: None,
            reviewer_id: None,
            reviewer_name: None,
            review_comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update to the descriptive payload.
    ///
    /// Only fields present in the patch change; `updated_at` is bumped.
    /// Status checks are the engine's job, not the model's.
    pub fn apply_patch(&mut self, patch: LogPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(activity_type) = patch.activity_type {
            self.activity_type = Some(activity_type);
        }
        if let Some(duration_minutes) = patch.duration_minutes {
            self.duration_minutes = Some(duration_minutes);
        }
        if let Some(findings) = patch.findings {
            self.findings = Some(findings);
        }
        if let Some(challenges) = patch.challenges {
            self.challenges = Some(challenges);
        }
        if let Some(next_steps) = patch.next_steps {
            self.next_steps = Some(next_steps);
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(attachments) = patch.attachments {
            self.attachments = attachments;
        }
        self.updated_at = Utc::now();
    }

    /// Record the transition into `SUBMITTED`
    pub fn mark_submitted(&mut self, now: DateTime<Utc>) {
        self.status = LogStatus::Submitted;
        self.submitted_at = Some(now);
        self.updated_at = now;
    }

    /// Record a review outcome (`RETURNED`, `ACCEPTED` or `DECLINED`)
    pub fn apply_review<I: Into<String>, N: Into<String>, C: Into<String>>(
        &mut self,
        outcome: LogStatus,
        reviewer_id: I,
        reviewer_name: N,
        comment: C,
        now: DateTime<Utc>,
    ) {
        self.status = outcome;
        self.reviewed_at = Some(now);
        self.reviewer_id = Some(reviewer_id.into());
        self.reviewer_name = Some(reviewer_name.into());
        self.review_comment = Some(comment.into());
        self.updated_at = now;
    }
}

/// Creation payload for a research log
///
/// `submit: true` asks for immediate submission after creation, reusing the
/// regular submit path (including its routing checks).
#[derive(Debug, Clone, Deserialize)]
pub struct NewLog {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub activity_type: Option<ActivityKind>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub findings: Option<String>,
    #[serde(default)]
    pub challenges: Option<String>,
    #[serde(default)]
    pub next_steps: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub submit: bool,
}

/// Partial update for a draft or returned log
///
/// An explicit struct with named optional fields rather than an untyped
/// key/value map: the set of patchable fields is statically enumerable and
/// unknown keys are rejected at deserialization time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub activity_type: Option<ActivityKind>,
    pub duration_minutes: Option<u32>,
    pub findings: Option<String>,
    pub challenges: Option<String>,
    pub next_steps: Option<String>,
    pub tags: Option<Vec<String>>,
    pub attachments: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALL: [LogStatus; 5] = [
        LogStatus::Draft,
        LogStatus::Submitted,
        LogStatus::Returned,
        LogStatus::Accepted,
        LogStatus::Declined,
    ];

    #[test]
    fn test_transition_table() {
        assert!(LogStatus::Draft.can_transition_to(LogStatus::Submitted));
        assert!(LogStatus::Submitted.can_transition_to(LogStatus::Returned));
        assert!(LogStatus::Submitted.can_transition_to(LogStatus::Accepted));
        assert!(LogStatus::Submitted.can_transition_to(LogStatus::Declined));
        assert!(LogStatus::Returned.can_transition_to(LogStatus::Submitted));
    }

    #[test]
    fn test_transition_closure() {
        // Every pair not in the table above must be rejected
        let allowed = [
            (LogStatus::Draft, LogStatus::Submitted),
            (LogStatus::Submitted, LogStatus::Returned),
            (LogStatus::Submitted, LogStatus::Accepted),
            (LogStatus::Submitted, LogStatus::Declined),
            (LogStatus::Returned, LogStatus::Submitted),
        ];
        for from in ALL {
            for to in ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(LogStatus::Accepted.is_terminal());
        assert!(LogStatus::Declined.is_terminal());
        assert!(!LogStatus::Draft.is_terminal());
        assert!(!LogStatus::Submitted.is_terminal());
        assert!(!LogStatus::Returned.is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        for status in ALL {
            // serde and as_str agree, and the mapping round-trips
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, json!(status.as_str()));
            let parsed: LogStatus = serde_json::from_value(wire).unwrap();
            assert_eq!(parsed, status);
            assert_eq!(status.as_str().parse::<LogStatus>().unwrap(), status);
        }
        assert!("submitted".parse::<LogStatus>().is_err());
        assert!("PUBLISHED".parse::<LogStatus>().is_err());
    }

    #[test]
    fn test_new_log_starts_in_draft() {
        let log = ResearchLog::new("student-1", "Calibration run");
        assert_eq!(log.status, LogStatus::Draft);
        assert!(log.submitted_at.is_none());
        assert!(log.review_comment.is_none());
        assert_eq!(log.created_at, log.updated_at);
    }

    #[test]
    fn test_review_fields_serialize_as_null() {
        let log = ResearchLog::new("student-1", "Calibration run");
        let value = serde_json::to_value(&log).unwrap();
        // Present with null values, never omitted
        assert!(value.get("review_comment").unwrap().is_null());
        assert!(value.get("reviewer_name").unwrap().is_null());
        assert!(value.get("reviewed_at").unwrap().is_null());
        assert!(value.get("submitted_at").unwrap().is_null());
    }

    #[test]
    fn test_apply_patch_updates_only_named_fields() {
        let mut log = ResearchLog::new("student-1", "Calibration run");
        log.description = Some("initial".to_string());
        let patch = LogPatch {
            title: Some("Calibration run, day 2".to_string()),
            tags: Some(vec!["calibration".to_string()]),
            ..LogPatch::default()
        };
        log.apply_patch(patch);
        assert_eq!(log.title, "Calibration run, day 2");
        assert_eq!(log.tags, vec!["calibration"]);
        assert_eq!(log.description.as_deref(), Some("initial"));
    }

    #[test]
    fn test_patch_rejects_unknown_keys() {
        let result: Result<LogPatch, _> =
            serde_json::from_value(json!({ "title": "x", "rating": 5 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_review_sets_reviewer_fields() {
        let mut log = ResearchLog::new("student-1", "Calibration run");
        log.mark_submitted(Utc::now());
        let now = Utc::now();
        log.apply_review(LogStatus::Returned, "sup-1", "Dr. Ortega", "add detail", now);
        assert_eq!(log.status, LogStatus::Returned);
        assert_eq!(log.reviewer_id.as_deref(), Some("sup-1"));
        assert_eq!(log.reviewer_name.as_deref(), Some("Dr. Ortega"));
        assert_eq!(log.review_comment.as_deref(), Some("add detail"));
        assert_eq!(log.reviewed_at, Some(now));
    }
}
