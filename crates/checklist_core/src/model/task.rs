//! Task domain model.
//!
//! # Invariants
//! - `id` is unique within its parent checklist.
//! - Serialized field names are camelCase to match exported files and remote
//!   documents.

use serde::{Deserialize, Serialize};

/// Category tag assigned to every task created by the editor.
pub const DEFAULT_CATEGORY: &str = "cat-1";

/// Single checklist entry with completion state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// Constant tag today; kept for file/document compatibility.
    pub category: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Task {
    /// Creates an unchecked task with a generated id.
    pub fn new(text: impl Into<String>, created_at: i64) -> Self {
        Self::with_id(super::fresh_id(), text, created_at)
    }

    /// Creates an unchecked task with a caller-provided id.
    pub fn with_id(id: impl Into<String>, text: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
            category: DEFAULT_CATEGORY.to_string(),
            created_at,
        }
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

/// View filter over a checklist's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    /// Returns whether `task` is visible under this filter.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}
