//! Task domain model: scheduling, ordering, time tracking, reminders.
//!
//! # Responsibility
//! - Define the task record and its nested collections.
//! - Own the recurrence-advancement and stable-color rules.
//!
//! # Invariants
//! - `order` is a dense, 1-based rank scoped to the task's status column.
//! - At most one time entry per task has `ended_at == None`.
//! - A task's color is assigned once at creation and never regenerated.

use chrono::{Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::dates::{calendar_date, calendar_date_opt};
use super::user::UserId;

/// Stable identifier for a task.
pub type TaskId = String;

/// Stable identifier for a subtask.
pub type SubtaskId = String;

/// Stable identifier for a time entry.
pub type TimeEntryId = String;

/// Stable identifier for a reminder.
pub type ReminderId = String;

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
pub const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;

/// Task lifecycle state, one Kanban column per value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// Task urgency used by dashboard sorting and Kanban filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Sort weight; higher means more urgent.
    pub fn weight(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Urgent => 3,
        }
    }
}

/// Where a recorded work interval came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeEntrySource {
    Pomodoro,
    #[default]
    Manual,
}

/// Reminder repetition policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    /// Advances a fire instant by exactly one period.
    ///
    /// Monthly keeps the day-of-month and clamps on shorter months. For
    /// `Recurrence::None` the instant is returned unchanged; the caller
    /// marks the reminder as terminally fired instead.
    pub fn advance(self, when_ms: i64) -> i64 {
        match self {
            Self::None => when_ms,
            Self::Daily => when_ms + MS_PER_DAY,
            Self::Weekly => when_ms + MS_PER_WEEK,
            Self::Monthly => add_one_month(when_ms).unwrap_or(when_ms + MS_PER_DAY),
        }
    }
}

fn add_one_month(when_ms: i64) -> Option<i64> {
    let datetime = Utc.timestamp_millis_opt(when_ms).single()?;
    datetime
        .checked_add_months(Months::new(1))
        .map(|next| next.timestamp_millis())
}

/// A checklist item nested in one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

/// A recorded start/stop interval of work on one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: TimeEntryId,
    pub started_at: i64,
    #[serde(default)]
    pub ended_at: Option<i64>,
    #[serde(default)]
    pub source: TimeEntrySource,
    #[serde(default)]
    pub note: Option<String>,
}

impl TimeEntry {
    pub fn is_running(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// A scheduled alert on one task, optionally recurring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub when: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub fired: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
}

/// A schedulable unit of work hosted by one note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(with = "calendar_date")]
    pub start_date: NaiveDate,
    #[serde(with = "calendar_date")]
    pub end_date: NaiveDate,
    #[serde(default, with = "calendar_date_opt")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub time_spent_ms: i64,
    #[serde(default)]
    pub pomodoros_completed: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub estimate_hours: Option<f64>,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub created_at: i64,
}

impl Task {
    /// Due date with the documented fallback to the end date.
    pub fn effective_due_date(&self) -> NaiveDate {
        self.due_date.unwrap_or(self.end_date)
    }

    /// Display color: the explicit color when set, else the stable hue
    /// derived from the task id.
    pub fn display_color(&self) -> String {
        match &self.color {
            Some(color) => color.clone(),
            None => default_task_color(&self.id),
        }
    }

    /// Returns the index of the currently running time entry, if any.
    pub fn running_entry_index(&self) -> Option<usize> {
        self.time_entries.iter().rposition(TimeEntry::is_running)
    }
}

/// Deterministic 31-based string hash shared by palette and hue selection.
pub(crate) fn key_hash(value: &str) -> u32 {
    value
        .bytes()
        .fold(0i32, |hash, byte| {
            hash.wrapping_mul(31).wrapping_add(byte as i32)
        })
        .unsigned_abs()
}

/// Stable hue in `0..360` derived from an id.
pub fn stable_hue(key: &str) -> u32 {
    key_hash(key) % 360
}

/// Default task color: id-keyed hue at fixed saturation/lightness.
pub fn default_task_color(key: &str) -> String {
    format!("hsl({} 90% 55%)", stable_hue(key))
}
