//! Kanban board projection.
//!
//! # Responsibility
//! - Partition a canvas's tasks into the three status columns.
//! - Apply the text-search and priority filters.
//!
//! # Invariants
//! - The board always contains exactly one column per status, in
//!   backlog-to-done order, even when empty.
//! - Cards within a column are sorted by (`order`, `created_at`).

use crate::model::note::{Note, NoteId};
use crate::model::task::{Task, TaskPriority, TaskStatus};

/// Filter applied to every card before it lands in a column.
#[derive(Debug, Clone, Default)]
pub struct KanbanFilter {
    /// Case-insensitive substring matched against the task name plus the
    /// owning note's title.
    pub query: Option<String>,
    pub priority: Option<TaskPriority>,
}

/// One task placed on the board, with its owning-note context.
#[derive(Debug, Clone, PartialEq)]
pub struct KanbanCard {
    pub task: Task,
    pub note_id: NoteId,
    pub note_title: String,
}

/// One status column of the board.
#[derive(Debug, Clone, PartialEq)]
pub struct KanbanColumn {
    pub status: TaskStatus,
    pub title: &'static str,
    pub cards: Vec<KanbanCard>,
}

/// Board column order and display titles.
pub const COLUMNS: [(TaskStatus, &str); 3] = [
    (TaskStatus::NotStarted, "Backlog"),
    (TaskStatus::InProgress, "In Progress"),
    (TaskStatus::Completed, "Done"),
];

/// Builds the Kanban board for the given notes.
pub fn board(notes: &[Note], filter: &KanbanFilter) -> Vec<KanbanColumn> {
    let query = filter
        .query
        .as_deref()
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .map(str::to_lowercase);

    let mut cards: Vec<KanbanCard> = Vec::new();
    for note in notes {
        let note_title = note.title();
        for task in &note.tasks {
            if let Some(priority) = filter.priority {
                if task.priority != priority {
                    continue;
                }
            }
            if let Some(query) = &query {
                let haystack = format!("{} {}", task.name, note_title).to_lowercase();
                if !haystack.contains(query) {
                    continue;
                }
            }
            cards.push(KanbanCard {
                task: task.clone(),
                note_id: note.id.clone(),
                note_title: note_title.clone(),
            });
        }
    }

    COLUMNS
        .iter()
        .map(|&(status, title)| {
            let mut column_cards: Vec<KanbanCard> = cards
                .iter()
                .filter(|card| card.task.status == status)
                .cloned()
                .collect();
            column_cards.sort_by_key(|card| (card.task.order, card.task.created_at));
            KanbanColumn {
                status,
                title,
                cards: column_cards,
            }
        })
        .collect()
}
