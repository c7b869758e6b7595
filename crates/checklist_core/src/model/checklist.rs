//! Checklist and checklist collection model.
//!
//! # Responsibility
//! - Hold ordered tasks per checklist; order is user-meaningful.
//! - Enforce collection-level invariants for every structural change.
//!
//! # Invariants
//! - The collection is never empty; removing the last checklist is rejected.
//! - `active_id` always names a member; it falls back to the first member
//!   whenever the previous target disappears.

use super::task::Task;
use super::{fresh_id, ChecklistError};
use serde::{Deserialize, Serialize};

/// Id of the checklist created when no local state exists.
pub const SEED_CHECKLIST_ID: &str = "default";
const SEED_CHECKLIST_NAME: &str = "My Tasks";

/// Named, ordered set of tasks. `id` doubles as the remote document key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: String,
    pub name: String,
    pub tasks: Vec<Task>,
}

impl Checklist {
    /// Creates an empty checklist with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }

    /// Returns `(completed, total)` task counts.
    pub fn progress(&self) -> (usize, usize) {
        let completed = self.tasks.iter().filter(|task| task.completed).count();
        (completed, self.tasks.len())
    }

    /// Moves `dragged_id` into the slot currently held by `target_id`.
    ///
    /// The dragged task is removed first and re-inserted at the target's
    /// original index, so dragging downwards lands after the target and
    /// dragging upwards lands before it.
    pub fn reorder(&mut self, dragged_id: &str, target_id: &str) -> Result<(), ChecklistError> {
        let dragged_index = self
            .tasks
            .iter()
            .position(|task| task.id == dragged_id)
            .ok_or_else(|| ChecklistError::TaskNotFound(dragged_id.to_string()))?;
        let target_index = self
            .tasks
            .iter()
            .position(|task| task.id == target_id)
            .ok_or_else(|| ChecklistError::TaskNotFound(target_id.to_string()))?;

        let moved = self.tasks.remove(dragged_index);
        self.tasks.insert(target_index, moved);
        Ok(())
    }

    /// Unchecks every task.
    pub fn reset_checks(&mut self) {
        for task in &mut self.tasks {
            task.completed = false;
        }
    }
}

/// Ordered, never-empty set of checklists plus the active selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistCollection {
    lists: Vec<Checklist>,
    active_id: String,
}

impl ChecklistCollection {
    /// Builds a collection, resolving `active_id` or falling back to the first
    /// checklist.
    ///
    /// # Errors
    /// - `EmptyCollection` when `lists` is empty.
    pub fn new(lists: Vec<Checklist>, active_id: Option<&str>) -> Result<Self, ChecklistError> {
        let first_id = match lists.first() {
            Some(first) => first.id.clone(),
            None => return Err(ChecklistError::EmptyCollection),
        };
        let active_id = active_id
            .filter(|id| lists.iter().any(|list| list.id == *id))
            .map(str::to_string)
            .unwrap_or(first_id);
        Ok(Self { lists, active_id })
    }

    /// Seed state used when nothing is cached locally.
    pub fn seed(now_ms: i64) -> Self {
        let seed = Checklist {
            id: SEED_CHECKLIST_ID.to_string(),
            name: SEED_CHECKLIST_NAME.to_string(),
            tasks: vec![
                Task::with_id("1", "Welcome to your checklist", now_ms),
                Task::with_id("2", "Add items below to get started", now_ms),
            ],
        };
        Self {
            active_id: seed.id.clone(),
            lists: vec![seed],
        }
    }

    pub fn lists(&self) -> &[Checklist] {
        &self.lists
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// A built collection is never empty.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active(&self) -> &Checklist {
        let index = self.active_index();
        &self.lists[index]
    }

    pub fn active_mut(&mut self) -> &mut Checklist {
        let index = self.active_index();
        &mut self.lists[index]
    }

    pub fn get(&self, id: &str) -> Option<&Checklist> {
        self.lists.iter().find(|list| list.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Makes `id` the active checklist.
    pub fn select(&mut self, id: &str) -> Result<(), ChecklistError> {
        if !self.contains(id) {
            return Err(ChecklistError::ChecklistNotFound(id.to_string()));
        }
        self.active_id = id.to_string();
        Ok(())
    }

    /// Appends a checklist without changing the selection.
    pub fn push(&mut self, list: Checklist) {
        self.lists.push(list);
    }

    /// Removes one checklist and re-resolves the selection.
    ///
    /// # Errors
    /// - `LastChecklist` when only one checklist remains.
    /// - `ChecklistNotFound` when `id` is not a member.
    pub fn remove(&mut self, id: &str) -> Result<Checklist, ChecklistError> {
        if self.lists.len() <= 1 {
            return Err(ChecklistError::LastChecklist);
        }
        let index = self
            .lists
            .iter()
            .position(|list| list.id == id)
            .ok_or_else(|| ChecklistError::ChecklistNotFound(id.to_string()))?;
        let removed = self.lists.remove(index);
        if self.active_id == removed.id {
            self.active_id = self.lists[0].id.clone();
        }
        Ok(removed)
    }

    /// Replaces every checklist and activates the first one.
    pub fn replace_all(&mut self, lists: Vec<Checklist>) -> Result<(), ChecklistError> {
        *self = Self::new(lists, None)?;
        Ok(())
    }

    fn active_index(&self) -> usize {
        self.lists
            .iter()
            .position(|list| list.id == self.active_id)
            .unwrap_or(0)
    }
}
