// LabFlow - research lab management backend
// Review workflow engine for student research logs, with real-time push

//! # LabFlow Library
//!
//! This is the main library crate for LabFlow, a research-lab management
//! backend. Its core is the **research log review workflow**: a small state
//! machine that moves a student-authored log between draft, submission,
//! supervisor review and terminal outcomes, with idempotent submission and
//! reliable notification fan-out to the interested parties.
//!
//! ## Core Components
//!
//! ### Domain Models
//! - [`ResearchLog`]: the one entity with lifecycle semantics
//! - [`LogStatus`]: the closed status enum carrying the transition table
//! - [`User`] / [`UserRole`] / [`AuthUser`]: lab membership and caller identity
//! - [`Notification`]: the durable, per-user notification record
//!
//! ### Workflow Engine
//! [`ReviewEngine`] validates and applies state transitions, enforces who may
//! invoke which transition, guarantees idempotency of `submit`, and triggers
//! the notification fan-out after each successful transition.
//!
//! ### Storage Layer
//! [`LabStore`] abstracts persistence behind an async trait with an in-memory
//! reference implementation ([`InMemoryStore`]). The engine never talks to a
//! concrete database.
//!
//! ### Real-Time Layer
//! [`ConnectionManager`] is the lifecycle-scoped registry of live WebSocket
//! connections; [`Notifier`] addresses events to one user, to a lab, or to
//! everyone, persisting the durable record before any push is attempted.
//!
//! ### HTTP Layer
//! Thin axum handlers under [`api`] translate verbs and bodies into engine
//! calls; [`server::ServerBuilder`] assembles the whole thing.

// Configuration loading (defaults < file < environment)
pub mod config;

// Core domain models
pub mod models;

// Storage abstraction and in-memory reference implementation
pub mod store;

// Workflow engine and notification fan-out
pub mod engine;

// Real-time connection registry
pub mod realtime;

// REST + WebSocket endpoint layer
pub mod api;

// Server assembly
pub mod server;

// Re-export core domain types for easy access
pub use models::{
    ActivityKind, AuthUser, LogPatch, LogStatus, NewLog, Notification, NotificationKind,
    ResearchLog, User, UserRole,
};

// Re-export engine and infrastructure types for convenience
pub use engine::{
    events::{EventKind, LabEvent, Notifier},
    workflow::{LogView, ReviewEngine, StudentStatusRow, SubmitOutcome},
};
pub use realtime::ConnectionManager;
pub use store::{InMemoryStore, LabStore};

pub use api::{create_router, ApiState};
pub use config::Settings;
pub use server::ServerBuilder;

use thiserror::Error;

/// Custom error types for LabFlow operations
///
/// The four leading variants form the taxonomy every transition endpoint can
/// surface: a missing log, an unauthorized caller, a transition not reachable
/// from the current state, and a submission with no supervisor to route to.
/// A correctly-authorized caller can still hit `InvalidTransition`; the two
/// are never collapsed.
#[derive(Error, Debug)]
pub enum LabError {
    /// The requested transition is not reachable from the current status.
    /// The message names both states so a client can see why it was rejected.
    #[error("Invalid transition: research log is {current}, cannot move to {requested}")]
    InvalidTransition {
        current: models::LogStatus,
        requested: models::LogStatus,
    },

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller lacks the role or ownership the operation requires.
    /// Never silently downgraded to a no-op.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A submission cannot be routed: the student has no assigned supervisor
    #[error("Cannot route submission: {0}")]
    MissingRouting(String),

    /// The request payload failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage-related errors
    /// Using anyhow::Error for flexible error handling across store backends
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for LabError {
    fn from(err: std::io::Error) -> Self {
        LabError::Internal(err.to_string())
    }
}

/// Type alias for Results that use our custom error type
pub type Result<T> = std::result::Result<T, LabError>;
