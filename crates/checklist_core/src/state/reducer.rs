//! Pure state transitions for editor actions.

use super::{Action, Effect};
use crate::model::checklist::{Checklist, ChecklistCollection};
use crate::model::task::Task;
use crate::model::ChecklistError;
use crate::transfer::ImportPayload;

/// Applies `action` to `collection` and returns the follow-up effect.
///
/// Rejected actions leave `collection` unchanged.
pub fn reduce(
    collection: &mut ChecklistCollection,
    action: Action,
    now_ms: i64,
) -> Result<Effect, ChecklistError> {
    match action {
        Action::AddTask { text } => {
            let text = text.trim();
            if text.is_empty() {
                return Err(ChecklistError::BlankTaskText);
            }
            collection.active_mut().tasks.push(Task::new(text, now_ms));
            Ok(active_sync(collection))
        }
        Action::ToggleTask { task_id } => {
            find_task(collection, &task_id)?.toggle();
            Ok(active_sync(collection))
        }
        Action::EditTaskText { task_id, text } => {
            find_task(collection, &task_id)?.text = text;
            Ok(active_sync(collection))
        }
        Action::DeleteTask { task_id } => {
            let tasks = &mut collection.active_mut().tasks;
            let index = tasks
                .iter()
                .position(|task| task.id == task_id)
                .ok_or(ChecklistError::TaskNotFound(task_id))?;
            tasks.remove(index);
            Ok(active_sync(collection))
        }
        Action::ReorderTask {
            dragged_id,
            target_id,
        } => {
            collection.active_mut().reorder(&dragged_id, &target_id)?;
            Ok(active_sync(collection))
        }
        Action::ResetChecks => {
            collection.active_mut().reset_checks();
            Ok(active_sync(collection))
        }
        Action::RenameActive { name } => {
            if name.trim().is_empty() {
                return Err(ChecklistError::BlankName);
            }
            collection.active_mut().name = name;
            Ok(active_sync(collection))
        }
        Action::CreateList => {
            let list = Checklist::new(format!("New List {}", collection.len() + 1));
            let id = list.id.clone();
            collection.push(list);
            collection.select(&id)?;
            Ok(Effect::SyncAll)
        }
        Action::SelectList { checklist_id } => {
            if collection.active_id() == checklist_id {
                return Ok(Effect::None);
            }
            let previous = collection.active_id().to_string();
            collection.select(&checklist_id)?;
            Ok(Effect::ActiveChanged { previous })
        }
        Action::DeleteList { checklist_id } => {
            let removed = collection.remove(&checklist_id)?;
            Ok(Effect::Removed {
                checklist_id: removed.id,
            })
        }
        Action::Import(payload) => {
            if payload.is_empty() {
                return Ok(Effect::None);
            }
            match payload {
                ImportPayload::Batch(lists) => lists.into_iter().for_each(|list| collection.push(list)),
                ImportPayload::Single(list) => {
                    let id = list.id.clone();
                    collection.push(list);
                    collection.select(&id)?;
                }
            }
            Ok(Effect::SyncAll)
        }
        Action::ReplaceAll(lists) => {
            collection.replace_all(lists)?;
            Ok(Effect::None)
        }
    }
}

fn active_sync(collection: &ChecklistCollection) -> Effect {
    Effect::ScheduleActiveSync {
        checklist_id: collection.active_id().to_string(),
    }
}

fn find_task<'a>(
    collection: &'a mut ChecklistCollection,
    task_id: &str,
) -> Result<&'a mut Task, ChecklistError> {
    collection
        .active_mut()
        .task_mut(task_id)
        .ok_or_else(|| ChecklistError::TaskNotFound(task_id.to_string()))
}
