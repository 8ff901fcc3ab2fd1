// Storage abstraction for LabFlow
// This defines the interface for persisting users, research logs and
// durable notifications

//! # Storage Abstraction Layer
//!
//! Persistence is an external collaborator: the workflow engine only ever
//! talks to the [`LabStore`] trait, which models an abstract document store
//! offering point lookups, filtered multi-record queries and whole-document
//! updates, all keyed by opaque string identifiers.
//!
//! ## Conventions
//!
//! - Lookups return `Result<Option<T>>`: the operation can fail, and if it
//!   succeeds the record may or may not exist. "Not found" is not a storage
//!   error; the engine decides what it means.
//! - List operations return newest first (by `created_at`).
//! - `update_log` replaces the whole document and is atomic per document.
//!   There is no compare-and-swap on `status`: concurrent transitions on the
//!   same log race and last write wins, an accepted limitation for the
//!   single-reviewer-per-log access pattern.
//!
//! The in-memory implementation ([`InMemoryStore`]) backs development and
//! the test suite; production deployments plug a database-backed
//! implementation in behind the same trait.

pub mod memory;

pub use memory::InMemoryStore;

use crate::models::{Notification, ResearchLog, User};
use crate::Result;

/// Document-store interface for all LabFlow collections
#[async_trait::async_trait]
pub trait LabStore: Send + Sync {
    // --- users ---

    /// Persist a new user record
    async fn create_user(&self, user: User) -> Result<User>;

    /// Point lookup by user id
    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// All user records
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Every student whose `supervisor_id` references the given supervisor
    async fn list_students_of(&self, supervisor_id: &str) -> Result<Vec<User>>;

    // --- research logs ---

    /// Persist a new research log
    async fn create_log(&self, log: ResearchLog) -> Result<ResearchLog>;

    /// Point lookup by log id
    async fn get_log(&self, id: &str) -> Result<Option<ResearchLog>>;

    /// Replace the stored log with the new version (atomic per document)
    async fn update_log(&self, log: ResearchLog) -> Result<ResearchLog>;

    /// Remove a log. Returns false when no such log existed.
    async fn delete_log(&self, id: &str) -> Result<bool>;

    /// All logs, newest first
    async fn list_logs(&self) -> Result<Vec<ResearchLog>>;

    /// Logs attributed to one student
    async fn list_logs_by_student(&self, student_id: &str) -> Result<Vec<ResearchLog>>;

    /// Logs attributed to any of the given students
    async fn list_logs_by_students(&self, student_ids: &[String]) -> Result<Vec<ResearchLog>>;

    /// Logs created by the given author
    async fn list_logs_by_author(&self, author_id: &str) -> Result<Vec<ResearchLog>>;

    // --- notifications ---

    /// Persist a durable notification
    async fn create_notification(&self, notification: Notification) -> Result<Notification>;

    /// Notifications addressed to one user, unread first then newest first
    async fn list_notifications_for(&self, user_id: &str) -> Result<Vec<Notification>>;

    /// Mark one notification as read. The addressee must match; returns
    /// false when no matching notification exists.
    async fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<bool>;
}
