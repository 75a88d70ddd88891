//! Unified domain model for the canvas/note/task store.
//!
//! # Responsibility
//! - Define the canonical records shared by the mutation engine, the
//!   persistence pipeline, and the derived-view projections.
//! - Keep serialized field names wire-compatible with legacy snapshots.
//!
//! # Invariants
//! - Every record is identified by a stable, opaque string id.
//! - Deletion removes a record from its parent collection; no tombstones.

pub mod canvas;
pub mod dates;
pub mod note;
pub mod task;
pub mod user;

use uuid::Uuid;

/// Generates a fresh opaque id.
///
/// Ids stay plain strings so records carrying legacy id formats keep
/// deserializing; newly minted ids are v4 UUIDs.
pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}
