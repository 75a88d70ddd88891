//! Durable snapshot storage bootstrap and migration entry points.
//!
//! # Responsibility
//! - Open and configure the SQLite connection backing the snapshot store.
//! - Host the versioned payload migration chain.
//!
//! # Invariants
//! - The snapshot schema exists before any repository reads or writes.
//! - A persisted snapshot version newer than this build is rejected, never
//!   silently rewritten.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-layer error for connection bootstrap and snapshot migration.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The persisted snapshot was written by a newer build.
    UnsupportedSnapshotVersion {
        found: u32,
        latest_supported: u32,
    },
    /// A migration step rejected the payload it was given.
    Migration {
        step: &'static str,
        reason: String,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSnapshotVersion {
                found,
                latest_supported,
            } => write!(
                f,
                "snapshot version {found} is newer than supported {latest_supported}"
            ),
            Self::Migration { step, reason } => {
                write!(f, "migration step `{step}` failed: {reason}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
