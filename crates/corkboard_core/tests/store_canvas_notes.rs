use std::cell::Cell;
use std::rc::Rc;

use corkboard_core::store::{MAX_ZOOM, MIN_ZOOM};
use corkboard_core::{CanvasType, Clock, NoteUpdate, NotesStore, Position};

#[test]
fn fresh_store_has_the_two_default_canvases() {
    let store = NotesStore::new();

    assert_eq!(store.canvas_order().len(), 2);
    let kinds: Vec<CanvasType> = store
        .canvas_order()
        .iter()
        .map(|id| store.canvases_meta()[id].kind)
        .collect();
    assert_eq!(kinds, vec![CanvasType::Idea, CanvasType::Project]);
    assert_eq!(
        store.active_canvas_meta().unwrap().kind,
        CanvasType::Idea
    );
}

#[test]
fn add_canvas_rejects_blank_names() {
    let mut store = NotesStore::new();
    assert!(store.add_canvas("   ", CanvasType::Idea).is_none());
    assert_eq!(store.canvas_order().len(), 2);
}

#[test]
fn add_canvas_appends_to_order_without_activating() {
    let mut store = NotesStore::new();
    let active_before = store.active_canvas_id().clone();

    let id = store.add_canvas("Sprint 1", CanvasType::Project).unwrap();

    assert_eq!(store.canvas_order().last(), Some(&id));
    assert_eq!(store.active_canvas_id(), &active_before);
    assert_eq!(store.canvases_meta()[&id].name, "Sprint 1");
}

#[test]
fn delete_canvas_never_removes_the_last_one() {
    let mut store = NotesStore::new();
    let order: Vec<String> = store.canvas_order().to_vec();

    store.delete_canvas(&order[1]);
    store.delete_canvas(&order[0]);

    assert_eq!(store.canvas_order().len(), 1);
    assert_eq!(store.canvas_order()[0], order[0]);
}

#[test]
fn deleting_the_active_canvas_activates_the_first_remaining() {
    let mut store = NotesStore::new();
    let order: Vec<String> = store.canvas_order().to_vec();
    store.set_active_canvas(&order[0]);

    store.delete_canvas(&order[0]);

    assert_eq!(store.active_canvas_id(), &order[1]);
    // History reseeds on activation: nothing to undo in the new canvas.
    assert!(!store.can_undo());
}

#[test]
fn new_note_gets_defaults_and_lands_on_top() {
    let mut store = NotesStore::new();
    let first = store.add_note(Position::new(10.0, 20.0));
    let second = store.add_note(Position::new(30.0, 40.0));

    let notes = store.notes();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].id, first);
    assert_eq!(notes[0].text, "New Note");
    assert_eq!(notes[0].width, 250.0);
    assert_eq!(notes[0].height, 200.0);
    assert_eq!(notes[0].z_index, 1);
    assert_eq!(notes[1].z_index, 2);
    assert_eq!(store.selected_note_id(), Some(&second));
}

#[test]
fn bring_to_front_assigns_max_z_plus_one() {
    let mut store = NotesStore::new();
    let first = store.add_note(Position::default());
    store.add_note(Position::default());
    store.add_note(Position::default());

    store.bring_to_front(&first);

    let raised = store.notes().iter().find(|note| note.id == first).unwrap();
    assert_eq!(raised.z_index, 4);
}

#[test]
fn update_note_merges_fields_and_bumps_updated_at() {
    let (mut store, clock) = store_with_clock(1_000);
    let id = store.add_note(Position::default());

    clock.set(5_000);
    store.update_note(
        &id,
        NoteUpdate {
            text: Some("groceries".to_string()),
            color: Some("#1e3a5f".to_string()),
            ..NoteUpdate::default()
        },
    );

    let note = &store.notes()[0];
    assert_eq!(note.text, "groceries");
    assert_eq!(note.color, "#1e3a5f");
    assert_eq!(note.created_at, 1_000);
    assert_eq!(note.updated_at, 5_000);
}

#[test]
fn move_and_resize_do_not_enter_history() {
    let mut store = NotesStore::new();
    let id = store.add_note(Position::default());
    assert!(store.can_undo());

    store.undo();
    store.redo();
    let undoable_before = store.history().index();

    store.move_note(&id, Position::new(500.0, 500.0));
    store.resize_note(&id, 300.0, 120.0);

    assert_eq!(store.history().index(), undoable_before);
    let note = &store.notes()[0];
    assert_eq!((note.x, note.y), (500.0, 500.0));
    assert_eq!((note.width, note.height), (300.0, 120.0));
}

#[test]
fn delete_note_clears_it_from_selection() {
    let mut store = NotesStore::new();
    let id = store.add_note(Position::default());
    assert_eq!(store.selected_note_id(), Some(&id));

    store.delete_note(&id);

    assert!(store.notes().is_empty());
    assert!(store.selected_note_id().is_none());
    assert!(store.selected_note_ids().is_empty());
}

#[test]
fn duplicate_note_clones_visuals_only_at_an_offset() {
    let mut store = NotesStore::new();
    let projects = store.canvas_order()[1].clone();
    store.set_active_canvas(&projects);

    let original = store.add_note(Position::new(100.0, 100.0));
    store.update_note(
        &original,
        NoteUpdate {
            text: Some("release plan".to_string()),
            ..NoteUpdate::default()
        },
    );
    store.add_task(
        &original,
        corkboard_core::NewTask::new("Design", date(2024, 1, 1), date(2024, 1, 5)),
    );

    let copy_id = store.duplicate_note(&original).unwrap();
    let copy = store
        .notes()
        .iter()
        .find(|note| note.id == copy_id)
        .unwrap();

    assert_eq!((copy.x, copy.y), (130.0, 130.0));
    assert_eq!(copy.text, "release plan");
    assert!(copy.tasks.is_empty());
    assert!(copy.attachments.is_empty());
    assert_eq!(store.selected_note_id(), Some(&copy_id));
}

#[test]
fn undo_redo_restore_structurally_equal_states() {
    let mut store = NotesStore::new();
    store.add_note(Position::default());
    let before = store.notes().to_vec();

    let id = store.add_note(Position::new(50.0, 60.0));
    store.update_note(
        &id,
        NoteUpdate {
            text: Some("second".to_string()),
            ..NoteUpdate::default()
        },
    );
    let after = store.notes().to_vec();

    store.undo();
    store.undo();
    assert_eq!(store.notes(), &before[..]);

    store.redo();
    store.redo();
    assert_eq!(store.notes(), &after[..]);
}

#[test]
fn switching_canvases_resets_history() {
    let mut store = NotesStore::new();
    store.add_note(Position::default());
    assert!(store.can_undo());

    let other = store.canvas_order()[1].clone();
    store.set_active_canvas(&other);

    assert!(!store.can_undo());
    assert!(!store.can_redo());
}

#[test]
fn delete_all_notes_is_undoable() {
    let mut store = NotesStore::new();
    store.add_note(Position::default());
    store.add_note(Position::default());

    store.delete_all_notes();
    assert!(store.notes().is_empty());

    store.undo();
    assert_eq!(store.notes().len(), 2);
}

#[test]
fn export_then_import_roundtrips_the_active_canvas() {
    let mut store = NotesStore::new();
    let id = store.add_note(Position::new(10.0, 10.0));
    store.update_note(
        &id,
        NoteUpdate {
            text: Some("call the plumber".to_string()),
            ..NoteUpdate::default()
        },
    );
    let exported = store.export_notes();

    store.delete_all_notes();
    assert!(store.notes().is_empty());

    store.import_notes(&exported);
    assert_eq!(store.notes().len(), 1);
    assert_eq!(store.notes()[0].text, "call the plumber");
}

#[test]
fn import_of_malformed_payload_leaves_state_unchanged() {
    let mut store = NotesStore::new();
    store.add_note(Position::default());
    let before = store.notes().to_vec();
    let history_index_before = store.history().index();

    store.import_notes("not valid json");

    assert_eq!(store.notes(), &before[..]);
    assert_eq!(store.history().index(), history_index_before);
}

#[test]
fn zoom_is_clamped_to_the_documented_range() {
    let mut store = NotesStore::new();
    store.set_zoom(99.0);
    assert_eq!(store.zoom(), MAX_ZOOM);
    store.set_zoom(0.0);
    assert_eq!(store.zoom(), MIN_ZOOM);

    store.set_pan(Position::new(40.0, -20.0));
    store.reset_view();
    assert_eq!(store.zoom(), 1.0);
    assert_eq!((store.pan().x, store.pan().y), (0.0, 0.0));
}

#[test]
fn idea_and_project_notes_draw_from_disjoint_palettes() {
    let mut store = NotesStore::new();
    store.add_note(Position::default());
    let idea_color = store.notes()[0].color.clone();

    let projects = store.canvas_order()[1].clone();
    store.set_active_canvas(&projects);
    store.add_note(Position::default());
    let project_color = store.notes()[0].color.clone();

    assert!(corkboard_core::model::note::IDEA_NOTE_COLORS.contains(&idea_color.as_str()));
    assert!(corkboard_core::model::note::PROJECT_NOTE_COLORS.contains(&project_color.as_str()));
    assert_ne!(idea_color, project_color);
}

fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn store_with_clock(start_ms: i64) -> (NotesStore, TestClock) {
    let clock = TestClock::new(start_ms);
    let store = NotesStore::with_clock(Box::new(clock.clone()));
    (store, clock)
}

#[derive(Clone)]
struct TestClock(Rc<Cell<i64>>);

impl TestClock {
    fn new(start_ms: i64) -> Self {
        Self(Rc::new(Cell::new(start_ms)))
    }

    fn set(&self, now_ms: i64) {
        self.0.set(now_ms);
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}
