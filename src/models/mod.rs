// Domain models for LabFlow
// Users and roles, research logs with their status state machine, and
// durable notifications

pub mod notification;
pub mod research_log;
pub mod user;

pub use notification::{Notification, NotificationKind};
pub use research_log::{ActivityKind, LogPatch, LogStatus, NewLog, ResearchLog};
pub use user::{AuthUser, User, UserRole};
