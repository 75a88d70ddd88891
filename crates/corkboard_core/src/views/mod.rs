//! Derived-view projections of the entity model.
//!
//! # Responsibility
//! - Project notes and tasks into Kanban columns, Gantt geometry, and
//!   dashboard aggregates.
//!
//! # Invariants
//! - Every projection is pure and side-effect-free; nothing here mutates or
//!   caches store state, so projections may be recomputed on every render.

pub mod dashboard;
pub mod gantt;
pub mod kanban;
