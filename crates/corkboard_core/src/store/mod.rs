//! The canvas/note/task state container and its mutation commands.
//!
//! # Responsibility
//! - Own the canonical per-canvas note collections and process-wide state.
//! - Apply every state transition issued by presentation layers.
//! - Feed note-level structural edits into the undo/redo history.
//!
//! # Invariants
//! - At least one canvas always exists.
//! - Invalid input and unknown ids degrade to a logged no-op; commands
//!   never return errors to callers.
//! - Only note-level structural edits (add/update/delete/duplicate,
//!   delete-all, import) push history; move/resize and task, attachment,
//!   and canvas-meta mutations do not.

pub mod history;
pub mod pomodoro;
pub mod reminders;
pub mod tasks;

use std::collections::BTreeMap;

use log::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::model::canvas::{CanvasId, CanvasMeta, CanvasType, Position};
use crate::model::fresh_id;
use crate::model::note::{
    palette_color, Attachment, AttachmentId, AttachmentKind, Note, NoteId,
};
use crate::model::user::{User, UserId};
use crate::repo::snapshot_repo::{PersistedState, SnapshotRepository};
use history::HistoryLog;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 3.0;

pub const DEFAULT_IDEA_CANVAS_NAME: &str = "Ideas";
pub const DEFAULT_PROJECT_CANVAS_NAME: &str = "Projects";

/// Offset applied to a duplicated note's position.
const DUPLICATE_OFFSET: f64 = 30.0;

/// Partial update for one note; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub text: Option<String>,
    pub color: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub z_index: Option<i64>,
}

/// Input for attachment creation. The url is ready-made (a link, or a data
/// URL produced by an external file reader); the core never reads files.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub kind: AttachmentKind,
    pub name: String,
    pub url: String,
}

/// The state container behind every canvas, note, and task command.
///
/// Owned by the application root and constructor-injected where needed, so
/// independent instances can exist side by side in tests.
pub struct NotesStore {
    canvases: BTreeMap<CanvasId, Vec<Note>>,
    canvases_meta: BTreeMap<CanvasId, CanvasMeta>,
    canvas_order: Vec<CanvasId>,
    active_canvas_id: CanvasId,
    selected_note_id: Option<NoteId>,
    selected_note_ids: Vec<NoteId>,
    pan: Position,
    zoom: f64,
    detail_view_note_id: Option<NoteId>,
    history: HistoryLog,
    users: Vec<User>,
    clock: Box<dyn Clock>,
}

impl Default for NotesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotesStore {
    /// Creates a store with the two default canvases and the system clock.
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    /// Creates a default store with an injected clock.
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        let now = clock.now_ms();
        let ideas = CanvasMeta::new(DEFAULT_IDEA_CANVAS_NAME, CanvasType::Idea, now);
        let projects = CanvasMeta::new(DEFAULT_PROJECT_CANVAS_NAME, CanvasType::Project, now);

        let mut canvases = BTreeMap::new();
        canvases.insert(ideas.id.clone(), Vec::new());
        canvases.insert(projects.id.clone(), Vec::new());

        let canvas_order = vec![ideas.id.clone(), projects.id.clone()];
        let active_canvas_id = ideas.id.clone();

        let mut canvases_meta = BTreeMap::new();
        canvases_meta.insert(ideas.id.clone(), ideas);
        canvases_meta.insert(projects.id.clone(), projects);

        Self {
            canvases,
            canvases_meta,
            canvas_order,
            active_canvas_id,
            selected_note_id: None,
            selected_note_ids: Vec::new(),
            pan: Position::default(),
            zoom: 1.0,
            detail_view_note_id: None,
            history: HistoryLog::seeded(&[]),
            users: Vec::new(),
            clock,
        }
    }

    /// Rebuilds a store from a migrated persisted snapshot.
    pub fn from_persisted(state: PersistedState) -> Self {
        Self::from_persisted_with_clock(state, Box::new(SystemClock))
    }

    /// Rebuilds a store from a persisted snapshot with an injected clock.
    ///
    /// Minor inconsistencies in the payload are repaired instead of
    /// rejected: canvases without notes get empty lists, the order is
    /// reconciled with the metadata map, and an unknown active id falls
    /// back to the first ordered canvas.
    pub fn from_persisted_with_clock(state: PersistedState, clock: Box<dyn Clock>) -> Self {
        let PersistedState {
            mut canvases,
            canvases_meta,
            mut canvas_order,
            active_canvas_id,
            pan,
            zoom,
        } = state;

        if canvases_meta.is_empty() {
            warn!("event=snapshot_restore module=store status=fallback reason=no_canvases");
            return Self::with_clock(clock);
        }

        canvases.retain(|id, _| canvases_meta.contains_key(id));
        for id in canvases_meta.keys() {
            canvases.entry(id.clone()).or_default();
        }
        canvas_order.retain(|id| canvases_meta.contains_key(id));
        for id in canvases_meta.keys() {
            if !canvas_order.contains(id) {
                canvas_order.push(id.clone());
            }
        }

        let active_canvas_id = if canvases_meta.contains_key(&active_canvas_id) {
            active_canvas_id
        } else {
            canvas_order[0].clone()
        };
        let history = HistoryLog::seeded(
            canvases
                .get(&active_canvas_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        );

        Self {
            canvases,
            canvases_meta,
            canvas_order,
            active_canvas_id,
            selected_note_id: None,
            selected_note_ids: Vec::new(),
            pan,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            detail_view_note_id: None,
            history,
            users: Vec::new(),
            clock,
        }
    }

    /// Loads the durable snapshot, falling back to a fresh default store on
    /// any failure. This boundary never propagates errors (startup must not
    /// be blocked by a corrupt snapshot).
    pub fn load_or_default(repo: &dyn SnapshotRepository) -> Self {
        Self::load_or_default_with_clock(repo, Box::new(SystemClock))
    }

    /// [`NotesStore::load_or_default`] with an injected clock.
    pub fn load_or_default_with_clock(
        repo: &dyn SnapshotRepository,
        clock: Box<dyn Clock>,
    ) -> Self {
        match repo.load() {
            Ok(Some(state)) => {
                info!("event=snapshot_load module=store status=ok");
                Self::from_persisted_with_clock(state, clock)
            }
            Ok(None) => {
                info!("event=snapshot_load module=store status=empty");
                Self::with_clock(clock)
            }
            Err(err) => {
                warn!(
                    "event=snapshot_load module=store status=error fallback=default error={err}"
                );
                Self::with_clock(clock)
            }
        }
    }

    /// Produces the durable subset of the current state.
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            canvases: self.canvases.clone(),
            canvases_meta: self.canvases_meta.clone(),
            canvas_order: self.canvas_order.clone(),
            active_canvas_id: self.active_canvas_id.clone(),
            pan: self.pan,
            zoom: self.zoom,
        }
    }

    // --- Canvas commands ---

    /// Creates a canvas and appends it to the display order. The new canvas
    /// does not become active. `None` when the name is blank.
    pub fn add_canvas(&mut self, name: &str, kind: CanvasType) -> Option<CanvasId> {
        let name = name.trim();
        if name.is_empty() {
            warn!("event=canvas_add module=store status=ignored reason=blank_name");
            return None;
        }

        let meta = CanvasMeta::new(name, kind, self.clock.now_ms());
        let id = meta.id.clone();
        self.canvases.insert(id.clone(), Vec::new());
        self.canvases_meta.insert(id.clone(), meta);
        self.canvas_order.push(id.clone());
        Some(id)
    }

    /// Renames a canvas. Blank names and unknown ids are ignored.
    pub fn rename_canvas(&mut self, canvas_id: &str, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            warn!("event=canvas_rename module=store status=ignored reason=blank_name");
            return;
        }
        match self.canvases_meta.get_mut(canvas_id) {
            Some(meta) => meta.name = name.to_string(),
            None => warn!(
                "event=canvas_rename module=store status=ignored reason=unknown_canvas id={canvas_id}"
            ),
        }
    }

    /// Deletes a canvas. The last remaining canvas is never deleted. When
    /// the active canvas is deleted, activation moves to the first of the
    /// remaining order and history reseeds from that canvas's notes.
    pub fn delete_canvas(&mut self, canvas_id: &str) {
        if !self.canvases_meta.contains_key(canvas_id) {
            warn!(
                "event=canvas_delete module=store status=ignored reason=unknown_canvas id={canvas_id}"
            );
            return;
        }
        if self.canvases_meta.len() <= 1 {
            warn!("event=canvas_delete module=store status=ignored reason=last_canvas");
            return;
        }

        self.canvases.remove(canvas_id);
        self.canvases_meta.remove(canvas_id);
        self.canvas_order.retain(|id| id != canvas_id);

        if self.active_canvas_id == canvas_id {
            let next_active = self
                .canvas_order
                .first()
                .cloned()
                .or_else(|| self.canvases_meta.keys().next().cloned())
                .unwrap_or_default();
            self.activate(next_active);
        }
    }

    /// Switches the active canvas, clearing selection and reseeding history
    /// from the target canvas's current notes.
    pub fn set_active_canvas(&mut self, canvas_id: &str) {
        if !self.canvases_meta.contains_key(canvas_id) {
            warn!(
                "event=canvas_activate module=store status=ignored reason=unknown_canvas id={canvas_id}"
            );
            return;
        }
        self.activate(canvas_id.to_string());
    }

    fn activate(&mut self, canvas_id: CanvasId) {
        self.active_canvas_id = canvas_id;
        self.selected_note_id = None;
        self.selected_note_ids.clear();
        self.detail_view_note_id = None;
        let notes = self
            .canvases
            .get(&self.active_canvas_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        // History is per-canvas and session-only; entering a canvas starts a
        // fresh single-entry log.
        self.history = HistoryLog::seeded(notes);
    }

    // --- Note commands ---

    /// Creates a note on the active canvas, marks it selected, and pushes a
    /// history entry. The note color comes from the canvas-type palette and
    /// the note lands on top of the stack.
    pub fn add_note(&mut self, position: Position) -> NoteId {
        let now = self.clock.now_ms();
        let kind = self
            .canvases_meta
            .get(&self.active_canvas_id)
            .map(|meta| meta.kind)
            .unwrap_or(CanvasType::Idea);

        let id = fresh_id();
        let color = palette_color(kind, &id);
        let notes = self
            .canvases
            .entry(self.active_canvas_id.clone())
            .or_default();
        let z_index = max_z_index(notes) + 1;
        notes.push(Note::with_id(id.clone(), position, color, z_index, now));

        self.selected_note_id = Some(id.clone());
        self.selected_note_ids = vec![id.clone()];
        self.push_history();
        id
    }

    /// Merges the given fields into a note, bumps `updated_at`, and pushes a
    /// history entry.
    pub fn update_note(&mut self, note_id: &str, update: NoteUpdate) {
        let now = self.clock.now_ms();
        let Some(note) = self.active_note_mut(note_id) else {
            warn!("event=note_update module=store status=ignored reason=unknown_note id={note_id}");
            return;
        };

        if let Some(text) = update.text {
            note.text = text;
        }
        if let Some(color) = update.color {
            note.color = color;
        }
        if let Some(x) = update.x {
            note.x = x;
        }
        if let Some(y) = update.y {
            note.y = y;
        }
        if let Some(width) = update.width {
            note.width = width;
        }
        if let Some(height) = update.height {
            note.height = height;
        }
        if let Some(rotation) = update.rotation {
            note.rotation = rotation;
        }
        if let Some(z_index) = update.z_index {
            note.z_index = z_index;
        }
        note.touch(now);
        self.push_history();
    }

    /// Repositions a note without touching history or selection. Continuous
    /// drag updates would otherwise flood the undo stack.
    pub fn move_note(&mut self, note_id: &str, position: Position) {
        let now = self.clock.now_ms();
        let Some(note) = self.active_note_mut(note_id) else {
            warn!("event=note_move module=store status=ignored reason=unknown_note id={note_id}");
            return;
        };
        note.x = position.x;
        note.y = position.y;
        note.touch(now);
    }

    /// Resizes a note without touching history or selection.
    pub fn resize_note(&mut self, note_id: &str, width: f64, height: f64) {
        let now = self.clock.now_ms();
        let Some(note) = self.active_note_mut(note_id) else {
            warn!("event=note_resize module=store status=ignored reason=unknown_note id={note_id}");
            return;
        };
        note.width = width;
        note.height = height;
        note.touch(now);
    }

    /// Raises a note to the top of the stacking order.
    pub fn bring_to_front(&mut self, note_id: &str) {
        let Some(notes) = self.canvases.get_mut(&self.active_canvas_id) else {
            return;
        };
        let max_z = max_z_index(notes);
        match notes.iter_mut().find(|note| note.id == note_id) {
            Some(note) => note.z_index = max_z + 1,
            None => warn!(
                "event=note_raise module=store status=ignored reason=unknown_note id={note_id}"
            ),
        }
    }

    /// Deletes a note, removes it from the selection set, and pushes a
    /// history entry.
    pub fn delete_note(&mut self, note_id: &str) {
        let Some(notes) = self.canvases.get_mut(&self.active_canvas_id) else {
            return;
        };
        let before = notes.len();
        notes.retain(|note| note.id != note_id);
        if notes.len() == before {
            warn!("event=note_delete module=store status=ignored reason=unknown_note id={note_id}");
            return;
        }

        if self.selected_note_id.as_deref() == Some(note_id) {
            self.selected_note_id = None;
        }
        self.selected_note_ids.retain(|id| id != note_id);
        if self.detail_view_note_id.as_deref() == Some(note_id) {
            self.detail_view_note_id = None;
        }
        self.push_history();
    }

    /// Clones a note's visual properties at a +30/+30 offset with a fresh id
    /// and a fresh top z-index. Tasks and attachments are not duplicated.
    pub fn duplicate_note(&mut self, note_id: &str) -> Option<NoteId> {
        let now = self.clock.now_ms();
        let notes = self.canvases.get_mut(&self.active_canvas_id)?;
        let Some(original) = notes.iter().find(|note| note.id == note_id) else {
            warn!(
                "event=note_duplicate module=store status=ignored reason=unknown_note id={note_id}"
            );
            return None;
        };

        let mut duplicate = Note::new(
            Position::new(original.x + DUPLICATE_OFFSET, original.y + DUPLICATE_OFFSET),
            &original.color,
            max_z_index(notes) + 1,
            now,
        );
        duplicate.text = original.text.clone();
        duplicate.width = original.width;
        duplicate.height = original.height;

        let id = duplicate.id.clone();
        notes.push(duplicate);
        self.selected_note_id = Some(id.clone());
        self.selected_note_ids = vec![id.clone()];
        self.push_history();
        Some(id)
    }

    /// Clears the active canvas and records the empty state in history.
    pub fn delete_all_notes(&mut self) {
        if let Some(notes) = self.canvases.get_mut(&self.active_canvas_id) {
            notes.clear();
        }
        self.selected_note_id = None;
        self.selected_note_ids.clear();
        self.detail_view_note_id = None;
        self.push_history();
    }

    // --- Selection ---

    pub fn select_note(&mut self, note_id: Option<NoteId>) {
        self.selected_note_ids = note_id.iter().cloned().collect();
        self.selected_note_id = note_id;
    }

    pub fn select_notes(&mut self, note_ids: Vec<NoteId>) {
        self.selected_note_id = match note_ids.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        self.selected_note_ids = note_ids;
    }

    pub fn clear_selection(&mut self) {
        self.selected_note_id = None;
        self.selected_note_ids.clear();
    }

    // --- Viewport ---

    pub fn set_pan(&mut self, pan: Position) {
        self.pan = pan;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn reset_view(&mut self) {
        self.pan = Position::default();
        self.zoom = 1.0;
    }

    /// Session-only marker for the note whose detail view is open.
    pub fn set_detail_view_note(&mut self, note_id: Option<NoteId>) {
        self.detail_view_note_id = note_id;
    }

    // --- History ---

    pub fn undo(&mut self) {
        if let Some(snapshot) = self.history.undo() {
            self.canvases.insert(self.active_canvas_id.clone(), snapshot);
        }
    }

    pub fn redo(&mut self) {
        if let Some(snapshot) = self.history.redo() {
            self.canvases.insert(self.active_canvas_id.clone(), snapshot);
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Bulk operations ---

    /// Serializes the active canvas's notes to transportable JSON.
    pub fn export_notes(&self) -> String {
        match serde_json::to_string_pretty(self.notes()) {
            Ok(json) => json,
            Err(err) => {
                warn!("event=notes_export module=store status=error error={err}");
                "[]".to_string()
            }
        }
    }

    /// Replaces the active canvas's notes with a previously exported
    /// payload. A malformed payload is a logged no-op; the store is left
    /// unchanged and no error reaches the caller.
    pub fn import_notes(&mut self, data: &str) {
        match serde_json::from_str::<Vec<Note>>(data) {
            Ok(notes) => {
                self.canvases.insert(self.active_canvas_id.clone(), notes);
                self.push_history();
            }
            Err(err) => {
                warn!("event=notes_import module=store status=ignored reason=parse error={err}");
            }
        }
    }

    // --- Users ---

    /// Adds a user to the process-wide list. `None` when the name is blank.
    pub fn add_user(
        &mut self,
        name: &str,
        email: Option<String>,
        avatar_url: Option<String>,
    ) -> Option<UserId> {
        let name = name.trim();
        if name.is_empty() {
            warn!("event=user_add module=store status=ignored reason=blank_name");
            return None;
        }
        let mut user = User::new(name);
        user.email = email;
        user.avatar_url = avatar_url;
        let id = user.id.clone();
        self.users.push(user);
        Some(id)
    }

    /// Removes a user. Task assignee references are left dangling by design;
    /// consumers render them as "Unassigned".
    pub fn remove_user(&mut self, user_id: &str) {
        self.users.retain(|user| user.id != user_id);
    }

    // --- Attachments ---

    /// Attaches a ready-made `{kind, name, url}` resource to a note. A blank
    /// name falls back to the url.
    pub fn add_attachment(
        &mut self,
        note_id: &str,
        attachment: NewAttachment,
    ) -> Option<AttachmentId> {
        let now = self.clock.now_ms();
        let url = attachment.url.trim().to_string();
        if url.is_empty() {
            warn!("event=attachment_add module=store status=ignored reason=blank_url");
            return None;
        }

        let Some(note) = self.find_note_mut(note_id) else {
            warn!(
                "event=attachment_add module=store status=ignored reason=unknown_note id={note_id}"
            );
            return None;
        };

        let name = attachment.name.trim();
        let record = Attachment {
            id: fresh_id(),
            kind: attachment.kind,
            name: if name.is_empty() {
                url.clone()
            } else {
                name.to_string()
            },
            url,
            created_at: now,
        };
        let id = record.id.clone();
        note.attachments.push(record);
        note.touch(now);
        Some(id)
    }

    /// Removes an attachment from a note.
    pub fn remove_attachment(&mut self, note_id: &str, attachment_id: &str) {
        let now = self.clock.now_ms();
        let Some(note) = self.find_note_mut(note_id) else {
            warn!(
                "event=attachment_remove module=store status=ignored reason=unknown_note id={note_id}"
            );
            return;
        };
        let before = note.attachments.len();
        note.attachments.retain(|att| att.id != attachment_id);
        if note.attachments.len() == before {
            warn!(
                "event=attachment_remove module=store status=ignored reason=unknown_attachment id={attachment_id}"
            );
            return;
        }
        note.touch(now);
    }

    // --- Queries ---

    /// Notes of the active canvas.
    pub fn notes(&self) -> &[Note] {
        self.canvases
            .get(&self.active_canvas_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Notes of an arbitrary canvas.
    pub fn notes_of(&self, canvas_id: &str) -> Option<&[Note]> {
        self.canvases.get(canvas_id).map(Vec::as_slice)
    }

    pub fn canvases(&self) -> &BTreeMap<CanvasId, Vec<Note>> {
        &self.canvases
    }

    pub fn canvases_meta(&self) -> &BTreeMap<CanvasId, CanvasMeta> {
        &self.canvases_meta
    }

    pub fn canvas_order(&self) -> &[CanvasId] {
        &self.canvas_order
    }

    pub fn active_canvas_id(&self) -> &CanvasId {
        &self.active_canvas_id
    }

    pub fn active_canvas_meta(&self) -> Option<&CanvasMeta> {
        self.canvases_meta.get(&self.active_canvas_id)
    }

    pub fn selected_note_id(&self) -> Option<&NoteId> {
        self.selected_note_id.as_ref()
    }

    pub fn selected_note_ids(&self) -> &[NoteId] {
        &self.selected_note_ids
    }

    pub fn pan(&self) -> Position {
        self.pan
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn detail_view_note_id(&self) -> Option<&NoteId> {
        self.detail_view_note_id.as_ref()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    // --- Internals shared with the task/reminder command modules ---

    pub(crate) fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    fn active_note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        self.canvases
            .get_mut(&self.active_canvas_id)?
            .iter_mut()
            .find(|note| note.id == note_id)
    }

    /// Looks a note up across every canvas; task commands arriving from
    /// cross-canvas projections (Kanban, dashboard) address notes that may
    /// not live on the active canvas.
    pub(crate) fn find_note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        self.canvases
            .values_mut()
            .flat_map(|notes| notes.iter_mut())
            .find(|note| note.id == note_id)
    }

    pub(crate) fn active_notes_mut(&mut self) -> &mut Vec<Note> {
        self.canvases
            .entry(self.active_canvas_id.clone())
            .or_default()
    }

    fn push_history(&mut self) {
        let notes = self
            .canvases
            .get(&self.active_canvas_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        self.history.push(notes);
    }
}

fn max_z_index(notes: &[Note]) -> i64 {
    notes.iter().map(|note| note.z_index).max().unwrap_or(0)
}
