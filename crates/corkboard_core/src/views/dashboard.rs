//! Dashboard aggregates over every project-type canvas.
//!
//! # Responsibility
//! - Flatten tasks across project canvases with their note/canvas context.
//! - Count tasks by status, detect overdue tasks, and rank the upcoming
//!   list.
//!
//! # Invariants
//! - Overdue comparison is date-only; time of day never matters.
//! - The upcoming list holds at most [`UPCOMING_LIMIT`] tasks.

use chrono::NaiveDate;

use crate::model::canvas::{CanvasId, CanvasType};
use crate::model::note::NoteId;
use crate::model::task::{Task, TaskStatus};
use crate::store::NotesStore;

/// Maximum length of the upcoming list.
pub const UPCOMING_LIMIT: usize = 10;

/// A task paired with its owning note and canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskWithContext {
    pub task: Task,
    pub note_id: NoteId,
    pub note_title: String,
    pub canvas_id: CanvasId,
    pub canvas_name: String,
}

/// Status counts across every project canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub project_canvases: usize,
    pub project_notes: usize,
    pub total_tasks: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub overdue: usize,
}

/// True when a task is past its effective due date and not completed.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.status != TaskStatus::Completed && task.effective_due_date() < today
}

/// Flattens every task across all project-type canvases, in canvas display
/// order.
pub fn project_tasks(store: &NotesStore) -> Vec<TaskWithContext> {
    let mut tasks = Vec::new();
    for canvas_id in store.canvas_order() {
        let Some(meta) = store.canvases_meta().get(canvas_id) else {
            continue;
        };
        if meta.kind != CanvasType::Project {
            continue;
        }
        let Some(notes) = store.notes_of(canvas_id) else {
            continue;
        };
        for note in notes {
            let note_title = note.title();
            for task in &note.tasks {
                tasks.push(TaskWithContext {
                    task: task.clone(),
                    note_id: note.id.clone(),
                    note_title: note_title.clone(),
                    canvas_id: canvas_id.clone(),
                    canvas_name: meta.name.clone(),
                });
            }
        }
    }
    tasks
}

/// Counts tasks by status and overdue state across all project canvases.
pub fn stats(store: &NotesStore, today: NaiveDate) -> DashboardStats {
    let project_metas: Vec<_> = store
        .canvases_meta()
        .values()
        .filter(|meta| meta.kind == CanvasType::Project)
        .collect();
    let project_notes = project_metas
        .iter()
        .filter_map(|meta| store.notes_of(&meta.id))
        .map(|notes| notes.len())
        .sum();

    let tasks = project_tasks(store);
    let count_status = |status: TaskStatus| {
        tasks
            .iter()
            .filter(|entry| entry.task.status == status)
            .count()
    };

    DashboardStats {
        project_canvases: project_metas.len(),
        project_notes,
        total_tasks: tasks.len(),
        completed: count_status(TaskStatus::Completed),
        in_progress: count_status(TaskStatus::InProgress),
        not_started: count_status(TaskStatus::NotStarted),
        overdue: tasks
            .iter()
            .filter(|entry| is_overdue(&entry.task, today))
            .count(),
    }
}

/// The ten soonest open tasks: overdue first, then due date ascending,
/// priority descending, column order ascending, creation time ascending.
pub fn upcoming(tasks: &[TaskWithContext], today: NaiveDate) -> Vec<TaskWithContext> {
    let mut open: Vec<TaskWithContext> = tasks
        .iter()
        .filter(|entry| entry.task.status != TaskStatus::Completed)
        .cloned()
        .collect();

    open.sort_by(|a, b| {
        let a_task = &a.task;
        let b_task = &b.task;
        is_overdue(b_task, today)
            .cmp(&is_overdue(a_task, today))
            .then_with(|| a_task.effective_due_date().cmp(&b_task.effective_due_date()))
            .then_with(|| b_task.priority.weight().cmp(&a_task.priority.weight()))
            .then_with(|| a_task.order.cmp(&b_task.order))
            .then_with(|| a_task.created_at.cmp(&b_task.created_at))
    });

    open.truncate(UPCOMING_LIMIT);
    open
}
