//! Snapshot repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the partialized store state as one versioned JSON payload.
//! - Run loaded payloads through the migration chain before decoding.
//!
//! # Invariants
//! - Exactly the persisted subset is stored: canvases, canvas metadata,
//!   canvas order, active canvas id, pan, zoom. Selection, history, and
//!   detail-view state never reach durable storage.
//! - Saved payloads always carry the latest snapshot version.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::migrations::{latest_version, migrate_payload};
use crate::db::DbError;
use crate::model::canvas::{CanvasId, CanvasMeta, Position};
use crate::model::note::Note;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for snapshot persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Payload text is not valid JSON or does not match the state shape.
    Decode(serde_json::Error),
    /// The connection was not bootstrapped through `open_db`.
    MissingSnapshotTable,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "invalid snapshot payload: {err}"),
            Self::MissingSnapshotTable => {
                write!(f, "connection has no snapshot table; open it via open_db")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::MissingSnapshotTable => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

fn default_zoom() -> f64 {
    1.0
}

/// The durably persisted subset of store state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub canvases: BTreeMap<CanvasId, Vec<Note>>,
    pub canvases_meta: BTreeMap<CanvasId, CanvasMeta>,
    pub canvas_order: Vec<CanvasId>,
    pub active_canvas_id: CanvasId,
    #[serde(default)]
    pub pan: Position,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

/// Repository interface for the durable snapshot.
pub trait SnapshotRepository {
    /// Loads and migrates the persisted snapshot. `None` when absent.
    fn load(&self) -> RepoResult<Option<PersistedState>>;
    /// Replaces the persisted snapshot with the given state.
    fn save(&self, state: &PersistedState) -> RepoResult<()>;
}

/// SQLite-backed snapshot repository over the single-row `snapshot` table.
#[derive(Debug)]
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Constructs a repository from a bootstrapped connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !snapshot_table_exists(conn)? {
            return Err(RepoError::MissingSnapshotTable);
        }
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn load(&self) -> RepoResult<Option<PersistedState>> {
        let mut stmt = self
            .conn
            .prepare("SELECT version, payload FROM snapshot WHERE id = 1;")?;
        let mut rows = stmt.query([])?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let version: u32 = row.get("version")?;
        let payload_text: String = row.get("payload")?;

        let mut payload: Value = serde_json::from_str(&payload_text)?;
        migrate_payload(version, &mut payload)?;
        let state: PersistedState = serde_json::from_value(payload)?;
        Ok(Some(state))
    }

    fn save(&self, state: &PersistedState) -> RepoResult<()> {
        let payload = serde_json::to_string(state)?;
        self.conn.execute(
            "INSERT INTO snapshot (id, version, payload, saved_at)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT (id) DO UPDATE SET
                version = excluded.version,
                payload = excluded.payload,
                saved_at = excluded.saved_at;",
            params![
                latest_version(),
                payload,
                Utc::now().timestamp_millis()
            ],
        )?;
        Ok(())
    }
}

fn snapshot_table_exists(conn: &Connection) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'snapshot'
        );",
        [],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
