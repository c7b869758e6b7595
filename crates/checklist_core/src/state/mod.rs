//! Explicit application state and the actions that change it.
//!
//! # Responsibility
//! - Hold the checklist collection and session phase as one value.
//! - Describe every editor mutation as an `Action` and every follow-up
//!   side effect as an `Effect`.
//!
//! # Invariants
//! - Only `reducer::reduce` mutates the collection in response to actions.
//! - Effects are data; the controller decides how to run them.

pub mod reducer;

use crate::model::checklist::{Checklist, ChecklistCollection};
use crate::model::identity::Identity;
use crate::transfer::ImportPayload;

/// Where an authenticated session is in its sync lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Remote read for this identity is in progress.
    Hydrating,
    /// Remote writes are enabled.
    Steady,
    /// Remote read failed; edits stay local until `rehydrate`.
    HydrationFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the first auth-state event.
    Resolving,
    Unauthenticated,
    Authenticated { identity: Identity, phase: AuthPhase },
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated { identity, .. } => Some(identity),
            Self::Resolving | Self::Unauthenticated => None,
        }
    }

    /// Identity allowed to write remotely right now.
    pub fn sync_identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated {
                identity,
                phase: AuthPhase::Steady,
            } => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }
}

/// Whole application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub collection: ChecklistCollection,
    pub session: SessionState,
}

impl AppState {
    pub fn new(collection: ChecklistCollection) -> Self {
        Self {
            collection,
            session: SessionState::Resolving,
        }
    }
}

/// Editor and sync mutations applied through the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddTask { text: String },
    ToggleTask { task_id: String },
    EditTaskText { task_id: String, text: String },
    DeleteTask { task_id: String },
    /// Drag `dragged_id` onto the slot of `target_id`.
    ReorderTask { dragged_id: String, target_id: String },
    /// Uncheck every task of the active checklist.
    ResetChecks,
    RenameActive { name: String },
    CreateList,
    SelectList { checklist_id: String },
    DeleteList { checklist_id: String },
    Import(ImportPayload),
    /// Hydration: replace everything with remote checklists.
    ReplaceAll(Vec<Checklist>),
}

/// Side effect requested by a reduced action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Active checklist content changed; debounce a field update.
    ScheduleActiveSync { checklist_id: String },
    /// Structural change; batch-upsert the collection now.
    SyncAll,
    /// Selection moved away from `previous`.
    ActiveChanged { previous: String },
    /// Checklist removed locally.
    Removed { checklist_id: String },
}
