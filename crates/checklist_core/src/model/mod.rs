//! Checklist domain model.
//!
//! # Responsibility
//! - Define the task/checklist shapes shared by stores, reducer and transfer.
//! - Own the collection invariants (never empty, active id always resolves).
//!
//! # Invariants
//! - Every checklist and task is identified by a stable string id.
//! - A `ChecklistCollection` holds at least one checklist at all times.

pub mod checklist;
pub mod identity;
pub mod task;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Domain-level rejection for editor mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecklistError {
    /// The last remaining checklist cannot be deleted.
    LastChecklist,
    /// A collection must be built from at least one checklist.
    EmptyCollection,
    /// Target checklist id is not a member of the collection.
    ChecklistNotFound(String),
    /// Target task id is not part of the active checklist.
    TaskNotFound(String),
    /// Task text is blank after trim.
    BlankTaskText,
    /// Checklist name is blank after trim.
    BlankName,
}

impl Display for ChecklistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastChecklist => write!(f, "you must have at least one checklist"),
            Self::EmptyCollection => write!(f, "checklist collection cannot be empty"),
            Self::ChecklistNotFound(id) => write!(f, "checklist not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::BlankTaskText => write!(f, "task text must not be blank"),
            Self::BlankName => write!(f, "checklist name must not be blank"),
        }
    }
}

impl Error for ChecklistError {}

/// Generates a fresh random identifier for tasks, lists and imports.
pub fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
