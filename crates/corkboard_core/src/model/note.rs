//! Sticky-note domain model.
//!
//! # Responsibility
//! - Define the note record, its attachments, and note-level defaults.
//! - Derive the display title used by search and dashboard projections.
//!
//! # Invariants
//! - `z_index` values within one canvas are monotonically assigned; the
//!   most recently raised note carries the canvas maximum.
//! - Attachments are immutable once created except for removal.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::canvas::{CanvasType, Position};
use super::fresh_id;
use super::task::{key_hash, Task};

/// Stable identifier for a note.
pub type NoteId = String;

/// Stable identifier for an attachment.
pub type AttachmentId = String;

/// Default geometry for freshly created notes.
pub const DEFAULT_NOTE_TEXT: &str = "New Note";
pub const DEFAULT_NOTE_WIDTH: f64 = 250.0;
pub const DEFAULT_NOTE_HEIGHT: f64 = 200.0;

/// Display-title cap applied by [`Note::title`].
pub const NOTE_TITLE_MAX_CHARS: usize = 60;

/// Background palette for idea canvases.
pub const IDEA_NOTE_COLORS: [&str; 8] = [
    "#1f2937", "#1e293b", "#1e3a5f", "#1f2937", "#1a2332", "#1e2530", "#1c2333", "#1a1f2e",
];

/// Background palette for project canvases. Disjoint from the idea palette.
pub const PROJECT_NOTE_COLORS: [&str; 8] = [
    "#3d1a2e", "#3a1e33", "#3d2035", "#3b1d31", "#3e1f34", "#3c1e30", "#3a1d2f", "#3d1f33",
];

static TITLE_WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Picks a palette color for a note, keyed by the note id so the choice is
/// stable across reloads.
pub fn palette_color(kind: CanvasType, key: &str) -> &'static str {
    let colors = match kind {
        CanvasType::Idea => &IDEA_NOTE_COLORS,
        CanvasType::Project => &PROJECT_NOTE_COLORS,
    };
    colors[key_hash(key) as usize % colors.len()]
}

/// Attachment flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Link,
    File,
    Image,
}

/// A link or data-URL resource attached to one note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: AttachmentId,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub name: String,
    pub url: String,
    pub created_at: i64,
}

/// A positioned freeform text card; may host tasks and attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub color: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub z_index: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Note {
    /// Creates a note with default text and geometry at the given position.
    pub fn new(position: Position, color: &str, z_index: i64, now_ms: i64) -> Self {
        Self::with_id(fresh_id(), position, color, z_index, now_ms)
    }

    /// Creates a note with a caller-provided stable id.
    ///
    /// Used where the id feeds the palette choice before construction.
    pub fn with_id(
        id: NoteId,
        position: Position,
        color: &str,
        z_index: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            id,
            x: position.x,
            y: position.y,
            text: DEFAULT_NOTE_TEXT.to_string(),
            color: color.to_string(),
            width: DEFAULT_NOTE_WIDTH,
            height: DEFAULT_NOTE_HEIGHT,
            rotation: 0.0,
            z_index,
            created_at: now_ms,
            updated_at: now_ms,
            attachments: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Marks the note as updated at the given instant.
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms;
    }

    /// Derives the display title: first non-blank line, whitespace
    /// normalized, capped at [`NOTE_TITLE_MAX_CHARS`].
    pub fn title(&self) -> String {
        let first_line = self.text.lines().map(str::trim).find(|line| !line.is_empty());
        match first_line {
            None => "Untitled".to_string(),
            Some(line) => TITLE_WHITESPACE_RE
                .replace_all(line, " ")
                .chars()
                .take(NOTE_TITLE_MAX_CHARS)
                .collect(),
        }
    }
}
