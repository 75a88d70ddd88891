//! Pomodoro countdown helper and completion command.
//!
//! # Responsibility
//! - Track a focus/break countdown from a captured start instant.
//! - Record completed pomodoros on their task.
//!
//! # Invariants
//! - Remaining time is recomputed from the wall-clock delta, never from
//!   accumulated ticks, so drift from a suspended process self-corrects on
//!   resume.

use log::warn;

use super::NotesStore;

pub const DEFAULT_FOCUS_MS: i64 = 25 * 60 * 1000;
pub const DEFAULT_BREAK_MS: i64 = 5 * 60 * 1000;

/// A running pomodoro countdown.
///
/// The session is a plain value owned by the presentation layer; only its
/// completion touches store state (via [`NotesStore::complete_pomodoro`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PomodoroSession {
    pub started_at_ms: i64,
    pub duration_ms: i64,
}

impl PomodoroSession {
    /// Starts a focus session of the default length.
    pub fn focus(started_at_ms: i64) -> Self {
        Self {
            started_at_ms,
            duration_ms: DEFAULT_FOCUS_MS,
        }
    }

    /// Starts a break of the default length.
    pub fn short_break(started_at_ms: i64) -> Self {
        Self {
            started_at_ms,
            duration_ms: DEFAULT_BREAK_MS,
        }
    }

    /// Milliseconds left at the given instant, floored at zero.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        (self.started_at_ms + self.duration_ms - now_ms).max(0)
    }

    pub fn is_finished(&self, now_ms: i64) -> bool {
        self.remaining_ms(now_ms) == 0
    }
}

impl NotesStore {
    /// Records one completed pomodoro on a task.
    pub fn complete_pomodoro(&mut self, note_id: &str, task_id: &str) {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!(
                "event=pomodoro_complete module=store status=ignored reason=unknown_note id={note_id}"
            );
            return;
        };
        let Some(task) = note.tasks.iter_mut().find(|task| task.id == task_id) else {
            warn!(
                "event=pomodoro_complete module=store status=ignored reason=unknown_task id={task_id}"
            );
            return;
        };
        task.pomodoros_completed += 1;
        note.touch(now);
    }
}
