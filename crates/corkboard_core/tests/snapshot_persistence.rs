use corkboard_core::db::migrations::latest_version;
use corkboard_core::db::{open_db, open_db_in_memory};
use corkboard_core::{
    CanvasType, NewTask, NoteUpdate, NotesStore, Position, RepoError, SnapshotRepository,
    SqliteSnapshotRepository,
};
use rusqlite::{params, Connection};

#[test]
fn save_then_load_roundtrips_the_persisted_subset() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();

    let mut store = NotesStore::new();
    let canvas = store.add_canvas("Sprint 1", CanvasType::Project).unwrap();
    store.set_active_canvas(&canvas);
    let note = store.add_note(Position::new(100.0, 100.0));
    store.update_note(
        &note,
        NoteUpdate {
            text: Some("release plan".to_string()),
            ..NoteUpdate::default()
        },
    );
    store.add_task(
        &note,
        NewTask::new("Design", date(2024, 1, 1), date(2024, 1, 5)),
    );
    store.set_zoom(1.5);
    store.set_pan(Position::new(12.0, -7.0));

    repo.save(&store.persisted()).unwrap();
    let loaded = repo.load().unwrap().unwrap();

    assert_eq!(loaded, store.persisted());
    let restored = NotesStore::from_persisted(loaded);
    assert_eq!(restored.active_canvas_id(), &canvas);
    assert_eq!(restored.notes().len(), 1);
    assert_eq!(restored.notes()[0].tasks.len(), 1);
    assert_eq!(restored.zoom(), 1.5);
    // Session-only state never survives persistence.
    assert!(restored.selected_note_id().is_none());
    assert!(!restored.can_undo());
}

#[test]
fn save_overwrites_the_single_snapshot_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();

    let mut store = NotesStore::new();
    repo.save(&store.persisted()).unwrap();
    store.add_note(Position::default());
    repo.save(&store.persisted()).unwrap();

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM snapshot;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    let version: u32 = conn
        .query_row("SELECT version FROM snapshot WHERE id = 1;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn legacy_v1_snapshot_loads_through_the_migration_chain() {
    let conn = open_db_in_memory().unwrap();
    insert_snapshot(
        &conn,
        1,
        r##"{
            "canvases": {
                "1": [{ "id": "note-1700000000000-abc", "x": 0.0, "y": 0.0, "text": "idea",
                        "color": "#1f2937", "width": 250.0, "height": 200.0, "zIndex": 1 }],
                "2": [{ "id": "note-1700000000001-def", "x": 5.0, "y": 5.0, "text": "plan",
                        "color": "#3d1a2e", "width": 250.0, "height": 200.0, "zIndex": 1,
                        "tasks": [
                            { "id": "t-1", "name": "Design", "startDate": "2024-01-01",
                              "endDate": "2024-01-05", "progress": 0, "status": "not-started" }
                        ] }]
            },
            "activeCanvas": 2,
            "pan": { "x": 3.0, "y": 4.0 },
            "zoom": 0.8
        }"##,
    );

    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    let state = repo.load().unwrap().unwrap();
    let store = NotesStore::from_persisted(state);

    assert_eq!(store.canvas_order().len(), 2);
    assert_eq!(
        store.active_canvas_meta().unwrap().kind,
        CanvasType::Project
    );
    let plan = &store.notes()[0];
    assert_eq!(plan.text, "plan");
    let task = &plan.tasks[0];
    assert_eq!(task.order, 1);
    assert_eq!(task.due_date, Some(date(2024, 1, 5)));
    assert!(task.color.as_deref().unwrap().starts_with("hsl("));
    assert!(task.tags.is_empty());
    assert_eq!(store.zoom(), 0.8);
}

#[test]
fn corrupt_snapshot_falls_back_to_default_canvases() {
    let conn = open_db_in_memory().unwrap();
    insert_snapshot(&conn, latest_version(), "definitely not json {{");

    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    assert!(repo.load().is_err());

    let store = NotesStore::load_or_default(&repo);
    assert_eq!(store.canvas_order().len(), 2);
    assert!(store.notes().is_empty());
}

#[test]
fn snapshot_from_a_newer_build_falls_back_to_defaults() {
    let conn = open_db_in_memory().unwrap();
    insert_snapshot(&conn, latest_version() + 1, "{}");

    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    assert!(repo.load().is_err());

    let store = NotesStore::load_or_default(&repo);
    assert_eq!(store.canvas_order().len(), 2);
}

#[test]
fn absent_snapshot_initializes_the_default_canvases() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();

    assert!(repo.load().unwrap().is_none());

    let store = NotesStore::load_or_default(&repo);
    let kinds: Vec<CanvasType> = store
        .canvas_order()
        .iter()
        .map(|id| store.canvases_meta()[id].kind)
        .collect();
    assert_eq!(kinds, vec![CanvasType::Idea, CanvasType::Project]);
}

#[test]
fn unknown_active_canvas_id_is_repaired_on_restore() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();

    let store = NotesStore::new();
    let mut state = store.persisted();
    state.active_canvas_id = "gone".to_string();
    repo.save(&state).unwrap();

    let restored = NotesStore::load_or_default(&repo);
    assert_eq!(restored.active_canvas_id(), &restored.canvas_order()[0]);
}

#[test]
fn snapshot_survives_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("snapshot.db");

    let mut store = NotesStore::new();
    let note = store.add_note(Position::new(1.0, 2.0));
    store.update_note(
        &note,
        NoteUpdate {
            text: Some("persists".to_string()),
            ..NoteUpdate::default()
        },
    );

    {
        let conn = open_db(&db_path).unwrap();
        let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
        repo.save(&store.persisted()).unwrap();
    }

    let conn = open_db(&db_path).unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    let restored = NotesStore::load_or_default(&repo);
    assert_eq!(restored.notes().len(), 1);
    assert_eq!(restored.notes()[0].text, "persists");
}

#[test]
fn repository_rejects_unbootstrapped_connections() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteSnapshotRepository::try_new(&conn).unwrap_err();
    assert!(matches!(err, RepoError::MissingSnapshotTable));
}

fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn insert_snapshot(conn: &Connection, version: u32, payload: &str) {
    conn.execute(
        "INSERT INTO snapshot (id, version, payload, saved_at) VALUES (1, ?1, ?2, 0);",
        params![version, payload],
    )
    .unwrap();
}
