//! User records for task assignment.
//!
//! # Responsibility
//! - Define the process-wide user list entry.
//!
//! # Invariants
//! - `Task::assignee_id` is a weak reference; removing a user never
//!   cascades into tasks. Dangling references render as "Unassigned".

use serde::{Deserialize, Serialize};

use super::fresh_id;

/// Stable identifier for a user.
pub type UserId = String;

/// A person tasks can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl User {
    /// Creates a user with a fresh stable id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            name: name.into(),
            email: None,
            avatar_url: None,
        }
    }
}
