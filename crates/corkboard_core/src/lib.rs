//! Core domain logic for Corkboard.
//! This crate is the single source of truth for canvas/note/task invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;
pub mod views;

pub use clock::{Clock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::canvas::{CanvasId, CanvasMeta, CanvasType, Position};
pub use model::note::{Attachment, AttachmentKind, Note, NoteId};
pub use model::task::{
    Recurrence, Reminder, Subtask, Task, TaskId, TaskPriority, TaskStatus, TimeEntry,
    TimeEntrySource,
};
pub use model::user::{User, UserId};
pub use repo::snapshot_repo::{
    PersistedState, RepoError, RepoResult, SnapshotRepository, SqliteSnapshotRepository,
};
pub use store::history::HistoryLog;
pub use store::pomodoro::PomodoroSession;
pub use store::reminders::FiredReminder;
pub use store::tasks::{NewTask, TaskUpdate};
pub use store::{NewAttachment, NotesStore, NoteUpdate};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
