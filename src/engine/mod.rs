// Engine implementations
// The review workflow engine and the notification fan-out it triggers

pub mod events;
pub mod workflow;

pub use events::{EventKind, LabEvent, Notifier};
pub use workflow::{LogView, ReviewEngine, StudentStatusRow, SubmitOutcome};
