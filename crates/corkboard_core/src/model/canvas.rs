//! Canvas metadata and viewport primitives.
//!
//! # Responsibility
//! - Define canvas identity, typing, and the shared viewport value types.
//!
//! # Invariants
//! - A canvas id is stable for the canvas lifetime.
//! - At least one canvas always exists; the guard lives in the store.

use serde::{Deserialize, Serialize};

use super::fresh_id;

/// Stable identifier for a canvas.
pub type CanvasId = String;

/// Workspace flavor of a canvas.
///
/// Idea canvases hold freeform notes; project canvases additionally track
/// tasks, and feed the Kanban/Gantt/dashboard projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasType {
    Idea,
    Project,
}

/// Metadata record for one canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasMeta {
    pub id: CanvasId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CanvasType,
    pub created_at: i64,
}

impl CanvasMeta {
    /// Creates canvas metadata with a fresh stable id.
    pub fn new(name: impl Into<String>, kind: CanvasType, created_at: i64) -> Self {
        Self {
            id: fresh_id(),
            name: name.into(),
            kind,
            created_at,
        }
    }
}

/// 2D point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::{CanvasMeta, CanvasType};

    #[test]
    fn canvas_type_serializes_to_lowercase_tokens() {
        assert_eq!(
            serde_json::to_string(&CanvasType::Project).expect("canvas type should serialize"),
            "\"project\""
        );
    }

    #[test]
    fn canvas_meta_keeps_legacy_field_names() {
        let meta = CanvasMeta::new("Sprint 1", CanvasType::Project, 42);
        let json = serde_json::to_value(&meta).expect("canvas meta should serialize");
        assert_eq!(json["type"], "project");
        assert_eq!(json["createdAt"], 42);
    }
}
