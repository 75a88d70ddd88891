//! Reminder commands and the periodic due-reminder scan.
//!
//! # Responsibility
//! - Attach, detach, and snooze reminders on tasks.
//! - Fire due reminders and advance recurring ones atomically.
//!
//! # Invariants
//! - A non-recurring reminder fires once and becomes terminal
//!   (`fired = true`, `when` unchanged).
//! - A recurring reminder never becomes terminal: firing advances `when` by
//!   exactly one period and resets `fired`.
//! - The scan is idempotent per generation cycle; a reminder advanced in one
//!   scan is not due again until its next period.

use log::warn;

use crate::model::fresh_id;
use crate::model::note::NoteId;
use crate::model::task::{Recurrence, Reminder, ReminderId, TaskId};

use super::NotesStore;

const MS_PER_MINUTE: i64 = 60 * 1000;

/// A "reminder has fired" event handed to the external notification
/// collaborator. The core does not know how notifications are displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredReminder {
    pub reminder_id: ReminderId,
    pub note_id: NoteId,
    pub task_id: TaskId,
    pub task_name: String,
    pub message: Option<String>,
}

impl NotesStore {
    /// Attaches a reminder to a task with `fired = false`.
    pub fn add_reminder(
        &mut self,
        note_id: &str,
        task_id: &str,
        when_ms: i64,
        message: Option<String>,
        recurrence: Recurrence,
    ) -> Option<ReminderId> {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!(
                "event=reminder_add module=store status=ignored reason=unknown_note id={note_id}"
            );
            return None;
        };
        let Some(task) = note.tasks.iter_mut().find(|task| task.id == task_id) else {
            warn!(
                "event=reminder_add module=store status=ignored reason=unknown_task id={task_id}"
            );
            return None;
        };

        let reminder = Reminder {
            id: fresh_id(),
            when: when_ms,
            message,
            fired: false,
            recurrence,
        };
        let id = reminder.id.clone();
        task.reminders.push(reminder);
        note.touch(now);
        Some(id)
    }

    /// Removes a reminder from a task.
    pub fn remove_reminder(&mut self, note_id: &str, task_id: &str, reminder_id: &str) {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!(
                "event=reminder_remove module=store status=ignored reason=unknown_note id={note_id}"
            );
            return;
        };
        let Some(task) = note.tasks.iter_mut().find(|task| task.id == task_id) else {
            warn!(
                "event=reminder_remove module=store status=ignored reason=unknown_task id={task_id}"
            );
            return;
        };
        let before = task.reminders.len();
        task.reminders.retain(|reminder| reminder.id != reminder_id);
        if task.reminders.len() == before {
            warn!(
                "event=reminder_remove module=store status=ignored reason=unknown_reminder id={reminder_id}"
            );
            return;
        }
        note.touch(now);
    }

    /// Pushes a reminder out by the given number of minutes from now and
    /// clears its fired flag, regardless of recurrence.
    pub fn snooze_reminder(
        &mut self,
        note_id: &str,
        task_id: &str,
        reminder_id: &str,
        minutes: i64,
    ) {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!(
                "event=reminder_snooze module=store status=ignored reason=unknown_note id={note_id}"
            );
            return;
        };
        let Some(task) = note.tasks.iter_mut().find(|task| task.id == task_id) else {
            warn!(
                "event=reminder_snooze module=store status=ignored reason=unknown_task id={task_id}"
            );
            return;
        };
        match task
            .reminders
            .iter_mut()
            .find(|reminder| reminder.id == reminder_id)
        {
            Some(reminder) => {
                reminder.when = now + minutes.max(0) * MS_PER_MINUTE;
                reminder.fired = false;
                note.touch(now);
            }
            None => warn!(
                "event=reminder_snooze module=store status=ignored reason=unknown_reminder id={reminder_id}"
            ),
        }
    }

    /// Fires every due reminder on the active canvas.
    ///
    /// A reminder is due when `fired` is clear and `when` has passed. Firing
    /// and recurrence advancement happen in the same state update that
    /// produces the returned events, so a second scan at the same instant
    /// reports nothing new.
    pub fn scan_due_reminders(&mut self) -> Vec<FiredReminder> {
        let now = self.now_ms();
        let mut fired = Vec::new();

        for note in self.active_notes_mut().iter_mut() {
            let mut note_changed = false;
            for task in note.tasks.iter_mut() {
                for reminder in task.reminders.iter_mut() {
                    if reminder.fired || reminder.when > now {
                        continue;
                    }
                    fired.push(FiredReminder {
                        reminder_id: reminder.id.clone(),
                        note_id: note.id.clone(),
                        task_id: task.id.clone(),
                        task_name: task.name.clone(),
                        message: reminder.message.clone(),
                    });
                    match reminder.recurrence {
                        Recurrence::None => reminder.fired = true,
                        recurrence => {
                            reminder.when = recurrence.advance(reminder.when);
                            reminder.fired = false;
                        }
                    }
                    note_changed = true;
                }
            }
            if note_changed {
                note.touch(now);
            }
        }

        fired
    }
}
