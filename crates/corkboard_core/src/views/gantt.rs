//! Gantt timeline projection.
//!
//! # Responsibility
//! - Compute a shared date axis and per-task bar geometry as fractions of
//!   the total axis width.
//!
//! # Invariants
//! - The axis spans `[min(start) - 2d, max(end) + 2d]`, so it is never
//!   zero-length and every bar fits inside it.
//! - At most 10 evenly spaced tick divisions, never more than one per day.

use chrono::{Days, NaiveDate};

use crate::model::task::{Task, TaskId};

pub const AXIS_PADDING_DAYS: u64 = 2;
pub const MAX_TICK_DIVISIONS: i64 = 10;

/// Horizontal bar geometry for one task, as fractions of the axis width.
#[derive(Debug, Clone, PartialEq)]
pub struct GanttBar {
    pub task_id: TaskId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub left_frac: f64,
    pub width_frac: f64,
    pub progress: u8,
    pub color: String,
}

/// One evenly spaced axis tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GanttTick {
    pub date: NaiveDate,
    pub left_frac: f64,
}

/// The shared axis plus every task's bar geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GanttLayout {
    pub axis_start: NaiveDate,
    pub axis_end: NaiveDate,
    pub total_days: i64,
    pub bars: Vec<GanttBar>,
    pub ticks: Vec<GanttTick>,
}

/// Computes the timeline layout for the given tasks. `None` when there is
/// nothing to lay out.
pub fn layout(tasks: &[Task]) -> Option<GanttLayout> {
    let min_start = tasks.iter().map(|task| task.start_date).min()?;
    let max_end = tasks.iter().map(|task| task.end_date).max()?;

    let axis_start = min_start
        .checked_sub_days(Days::new(AXIS_PADDING_DAYS))
        .unwrap_or(min_start);
    let axis_end = max_end
        .checked_add_days(Days::new(AXIS_PADDING_DAYS))
        .unwrap_or(max_end);
    let total_days = (axis_end - axis_start).num_days();

    let bars = tasks
        .iter()
        .map(|task| {
            let offset_days = (task.start_date - axis_start).num_days();
            let duration_days = (task.end_date - task.start_date).num_days();
            GanttBar {
                task_id: task.id.clone(),
                name: task.name.clone(),
                start_date: task.start_date,
                end_date: task.end_date,
                left_frac: offset_days as f64 / total_days as f64,
                width_frac: duration_days as f64 / total_days as f64,
                progress: task.progress,
                color: task.display_color(),
            }
        })
        .collect();

    let divisions = MAX_TICK_DIVISIONS.min(total_days).max(1);
    let ticks = (0..=divisions)
        .map(|i| {
            let offset = i * total_days / divisions;
            GanttTick {
                date: axis_start
                    .checked_add_days(Days::new(offset as u64))
                    .unwrap_or(axis_end),
                left_frac: i as f64 / divisions as f64,
            }
        })
        .collect();

    Some(GanttLayout {
        axis_start,
        axis_end,
        total_days,
        bars,
        ticks,
    })
}
