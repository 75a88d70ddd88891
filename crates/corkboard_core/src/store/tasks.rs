//! Task commands: scheduling, ordering, subtasks, and time tracking.
//!
//! # Responsibility
//! - Apply every task-level state transition scoped to one note.
//! - Own the dense per-status `order` rules and time-entry accounting.
//!
//! # Invariants
//! - `order` values within one status column stay dense and 1-based after
//!   any sequence of `reorder_task` calls.
//! - At most one time entry per task is running at any time.
//! - Task mutations refresh the owning note's `updated_at` and never touch
//!   the undo history.

use chrono::NaiveDate;
use log::warn;

use crate::model::fresh_id;
use crate::model::task::{
    default_task_color, Subtask, SubtaskId, Task, TaskId, TaskPriority, TaskStatus, TimeEntry,
    TimeEntryId, TimeEntrySource,
};
use crate::model::user::UserId;

use super::NotesStore;

/// Input for task creation. Omitted fields resolve to the documented
/// defaults when the task is added.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub progress: u8,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub tags: Vec<String>,
    pub estimate_hours: Option<f64>,
    pub assignee_id: Option<UserId>,
}

impl NewTask {
    /// Creates task input with everything beyond the required fields left to
    /// defaults.
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date,
            end_date,
            due_date: None,
            progress: 0,
            status: TaskStatus::default(),
            priority: None,
            tags: Vec::new(),
            estimate_hours: None,
            assignee_id: None,
        }
    }
}

/// Partial update for one task; `None` fields are left unchanged.
///
/// A status change without an explicit `order` re-ranks the task at the end
/// of its destination column.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub progress: Option<u8>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub order: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub estimate_hours: Option<f64>,
    pub assignee_id: Option<UserId>,
}

impl NotesStore {
    /// Adds a task to a note. Defaults are resolved at creation: end-of-column
    /// `order`, stable id-keyed color, medium priority, due date falling back
    /// to the end date. `None` on a blank name or unknown note.
    pub fn add_task(&mut self, note_id: &str, new_task: NewTask) -> Option<TaskId> {
        let now = self.now_ms();
        let name = new_task.name.trim().to_string();
        if name.is_empty() {
            warn!("event=task_add module=store status=ignored reason=blank_name");
            return None;
        }
        let Some(note) = self.find_note_mut(note_id) else {
            warn!("event=task_add module=store status=ignored reason=unknown_note id={note_id}");
            return None;
        };

        let id = fresh_id();
        let order = max_order_in_column(&note.tasks, new_task.status) + 1;
        let task = Task {
            id: id.clone(),
            name,
            start_date: new_task.start_date,
            end_date: new_task.end_date,
            due_date: Some(new_task.due_date.unwrap_or(new_task.end_date)),
            progress: new_task.progress.min(100),
            status: new_task.status,
            priority: new_task.priority.unwrap_or_default(),
            order,
            color: Some(default_task_color(&id)),
            time_spent_ms: 0,
            pomodoros_completed: 0,
            tags: new_task.tags,
            subtasks: Vec::new(),
            estimate_hours: new_task.estimate_hours,
            assignee_id: new_task.assignee_id,
            time_entries: Vec::new(),
            reminders: Vec::new(),
            created_at: now,
        };
        note.tasks.push(task);
        note.touch(now);
        Some(id)
    }

    /// Merges the given fields into a task. When the status changes without
    /// an explicit order, the task lands at the end of its new column.
    /// Missing color/due-date defaults are re-resolved after the merge.
    pub fn update_task(&mut self, note_id: &str, task_id: &str, update: TaskUpdate) {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!("event=task_update module=store status=ignored reason=unknown_note id={note_id}");
            return;
        };
        let Some(index) = note.tasks.iter().position(|task| task.id == task_id) else {
            warn!("event=task_update module=store status=ignored reason=unknown_task id={task_id}");
            return;
        };

        let status_changed = update
            .status
            .is_some_and(|status| status != note.tasks[index].status);
        let next_order = if status_changed {
            let status = update.status.unwrap_or_default();
            Some(
                update
                    .order
                    .unwrap_or_else(|| max_order_in_column(&note.tasks, status) + 1),
            )
        } else {
            update.order
        };

        let task = &mut note.tasks[index];
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if !name.is_empty() {
                task.name = name;
            }
        }
        if let Some(start_date) = update.start_date {
            task.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            task.end_date = end_date;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(progress) = update.progress {
            task.progress = progress.min(100);
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(order) = next_order {
            task.order = order;
        }
        if let Some(tags) = update.tags {
            task.tags = tags;
        }
        if let Some(estimate_hours) = update.estimate_hours {
            task.estimate_hours = Some(estimate_hours);
        }
        if let Some(assignee_id) = update.assignee_id {
            task.assignee_id = Some(assignee_id);
        }

        if task.due_date.is_none() {
            task.due_date = Some(task.end_date);
        }
        if task.color.is_none() {
            task.color = Some(default_task_color(&task.id));
        }
        note.touch(now);
    }

    /// Removes a task from a note.
    pub fn remove_task(&mut self, note_id: &str, task_id: &str) {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!("event=task_remove module=store status=ignored reason=unknown_note id={note_id}");
            return;
        };
        let before = note.tasks.len();
        note.tasks.retain(|task| task.id != task_id);
        if note.tasks.len() == before {
            warn!("event=task_remove module=store status=ignored reason=unknown_task id={task_id}");
            return;
        }
        note.touch(now);
    }

    /// Moves a task to a status column, placing it at the given order or at
    /// the end of the column. Other tasks' orders are left untouched; use
    /// [`NotesStore::reorder_task`] for dense renumbering within a column.
    pub fn move_task(
        &mut self,
        note_id: &str,
        task_id: &str,
        status: TaskStatus,
        order: Option<i64>,
    ) {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!("event=task_move module=store status=ignored reason=unknown_note id={note_id}");
            return;
        };
        let Some(index) = note.tasks.iter().position(|task| task.id == task_id) else {
            warn!("event=task_move module=store status=ignored reason=unknown_task id={task_id}");
            return;
        };

        let order = order.unwrap_or_else(|| max_order_in_column(&note.tasks, status) + 1);
        let task = &mut note.tasks[index];
        task.status = status;
        task.order = order.max(1);
        note.touch(now);
    }

    /// Re-ranks a task within its status column, shifting the intervening
    /// tasks by one so the column stays dense and gap-free. The target order
    /// is clamped to the column bounds.
    pub fn reorder_task(&mut self, note_id: &str, task_id: &str, new_order: i64) {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!("event=task_reorder module=store status=ignored reason=unknown_note id={note_id}");
            return;
        };
        let Some(index) = note.tasks.iter().position(|task| task.id == task_id) else {
            warn!("event=task_reorder module=store status=ignored reason=unknown_task id={task_id}");
            return;
        };

        let status = note.tasks[index].status;
        let column_len = note
            .tasks
            .iter()
            .filter(|task| task.status == status)
            .count() as i64;
        let old_order = note.tasks[index].order;
        let new_order = new_order.clamp(1, column_len.max(1));
        if new_order == old_order {
            return;
        }

        for task in note.tasks.iter_mut().filter(|task| task.status == status) {
            if new_order < old_order {
                if task.order >= new_order && task.order < old_order {
                    task.order += 1;
                }
            } else if task.order > old_order && task.order <= new_order {
                task.order -= 1;
            }
        }
        note.tasks[index].order = new_order;
        note.touch(now);
    }

    // --- Subtasks ---

    /// Appends a checklist item to a task. `None` on a blank title.
    pub fn add_subtask(&mut self, note_id: &str, task_id: &str, title: &str) -> Option<SubtaskId> {
        let now = self.now_ms();
        let title = title.trim();
        if title.is_empty() {
            warn!("event=subtask_add module=store status=ignored reason=blank_title");
            return None;
        }
        let Some(note) = self.find_note_mut(note_id) else {
            warn!("event=subtask_add module=store status=ignored reason=unknown_note id={note_id}");
            return None;
        };
        let Some(task) = note.tasks.iter_mut().find(|task| task.id == task_id) else {
            warn!("event=subtask_add module=store status=ignored reason=unknown_task id={task_id}");
            return None;
        };

        let subtask = Subtask {
            id: fresh_id(),
            title: title.to_string(),
            done: false,
        };
        let id = subtask.id.clone();
        task.subtasks.push(subtask);
        note.touch(now);
        Some(id)
    }

    /// Flips a checklist item's `done` flag.
    pub fn toggle_subtask(&mut self, note_id: &str, task_id: &str, subtask_id: &str) {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!(
                "event=subtask_toggle module=store status=ignored reason=unknown_note id={note_id}"
            );
            return;
        };
        let Some(task) = note.tasks.iter_mut().find(|task| task.id == task_id) else {
            warn!(
                "event=subtask_toggle module=store status=ignored reason=unknown_task id={task_id}"
            );
            return;
        };
        match task
            .subtasks
            .iter_mut()
            .find(|subtask| subtask.id == subtask_id)
        {
            Some(subtask) => {
                subtask.done = !subtask.done;
                note.touch(now);
            }
            None => warn!(
                "event=subtask_toggle module=store status=ignored reason=unknown_subtask id={subtask_id}"
            ),
        }
    }

    // --- Time entries ---

    /// Starts a time entry on a task. A task with an entry already running
    /// is left unchanged, preserving the at-most-one-running invariant.
    pub fn start_time_entry(
        &mut self,
        note_id: &str,
        task_id: &str,
        source: TimeEntrySource,
        note_text: Option<String>,
    ) -> Option<TimeEntryId> {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!(
                "event=time_entry_start module=store status=ignored reason=unknown_note id={note_id}"
            );
            return None;
        };
        let Some(task) = note.tasks.iter_mut().find(|task| task.id == task_id) else {
            warn!(
                "event=time_entry_start module=store status=ignored reason=unknown_task id={task_id}"
            );
            return None;
        };
        if task.running_entry_index().is_some() {
            warn!(
                "event=time_entry_start module=store status=ignored reason=already_running task={task_id}"
            );
            return None;
        }

        let entry = TimeEntry {
            id: fresh_id(),
            started_at: now,
            ended_at: None,
            source,
            note: note_text,
        };
        let id = entry.id.clone();
        task.time_entries.push(entry);
        note.touch(now);
        Some(id)
    }

    /// Ends the given time entry, or the most recent running entry when no
    /// id is supplied, accumulating the elapsed interval into the task's
    /// `time_spent_ms`. A task with nothing running is left unchanged.
    pub fn stop_time_entry(&mut self, note_id: &str, task_id: &str, entry_id: Option<&str>) {
        let now = self.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!(
                "event=time_entry_stop module=store status=ignored reason=unknown_note id={note_id}"
            );
            return;
        };
        let Some(task) = note.tasks.iter_mut().find(|task| task.id == task_id) else {
            warn!(
                "event=time_entry_stop module=store status=ignored reason=unknown_task id={task_id}"
            );
            return;
        };

        let entry_index = match entry_id {
            Some(id) => task
                .time_entries
                .iter()
                .position(|entry| entry.id == id && entry.is_running()),
            None => task.running_entry_index(),
        };
        let Some(entry_index) = entry_index else {
            warn!(
                "event=time_entry_stop module=store status=ignored reason=not_running task={task_id}"
            );
            return;
        };

        let started_at = task.time_entries[entry_index].started_at;
        task.time_entries[entry_index].ended_at = Some(now);
        task.time_spent_ms += (now - started_at).max(0);
        note.touch(now);
    }
}

/// Highest `order` currently used in one status column of a task list.
pub(crate) fn max_order_in_column(tasks: &[Task], status: TaskStatus) -> i64 {
    tasks
        .iter()
        .filter(|task| task.status == status)
        .map(|task| task.order)
        .max()
        .unwrap_or(0)
}
