//! Checklist import/export file contract.
//!
//! # Responsibility
//! - Serialize one checklist or the whole collection as pretty JSON.
//! - Validate and normalize user-provided import files.
//!
//! # Invariants
//! - Every imported checklist receives a fresh id.
//! - Validation happens per candidate before anything is inserted.

use crate::model::checklist::{Checklist, ChecklistCollection};
use crate::model::fresh_id;
use crate::model::task::{Task, DEFAULT_CATEGORY};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// File name used when exporting every checklist.
pub const EXPORT_ALL_FILE_NAME: &str = "checklist_backup_all.json";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

#[derive(Debug)]
pub enum TransferError {
    /// Payload is not a checklist or an array of checklists.
    ImportFormatInvalid(String),
    Serialize(serde_json::Error),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImportFormatInvalid(details) => write!(f, "invalid import format: {details}"),
            Self::Serialize(err) => write!(f, "export serialization failed: {err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::ImportFormatInvalid(_) => None,
        }
    }
}

/// Export payload ready to be written to disk or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    /// UTF-8 pretty-printed JSON.
    pub contents: String,
}

/// Parsed import, already stamped with fresh ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportPayload {
    /// Array file; malformed entries were dropped.
    Batch(Vec<Checklist>),
    /// Single checklist object; becomes active after import.
    Single(Checklist),
}

impl ImportPayload {
    pub fn checklists(&self) -> &[Checklist] {
        match self {
            Self::Batch(lists) => lists,
            Self::Single(list) => std::slice::from_ref(list),
        }
    }

    pub fn len(&self) -> usize {
        self.checklists().len()
    }

    pub fn is_empty(&self) -> bool {
        self.checklists().is_empty()
    }
}

/// Exports every checklist as a JSON array.
pub fn export_collection(collection: &ChecklistCollection) -> Result<ExportFile, TransferError> {
    let contents =
        serde_json::to_string_pretty(collection.lists()).map_err(TransferError::Serialize)?;
    Ok(ExportFile {
        file_name: EXPORT_ALL_FILE_NAME.to_string(),
        contents,
    })
}

/// Exports one checklist as a JSON object.
pub fn export_checklist(checklist: &Checklist) -> Result<ExportFile, TransferError> {
    let contents = serde_json::to_string_pretty(checklist).map_err(TransferError::Serialize)?;
    Ok(ExportFile {
        file_name: export_file_name(&checklist.name),
        contents,
    })
}

/// Derives `{name}_checklist.json` with whitespace runs collapsed to `_`.
pub fn export_file_name(checklist_name: &str) -> String {
    format!(
        "{}_checklist.json",
        WHITESPACE_RE.replace_all(checklist_name, "_")
    )
}

/// Parses an import file.
///
/// Arrays keep only entries with a non-empty `name` and an array `tasks`;
/// a single object must satisfy the same rule.
///
/// # Errors
/// - `ImportFormatInvalid` for non-JSON text or any other shape.
pub fn parse_import(text: &str, now_ms: i64) -> Result<ImportPayload, TransferError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| TransferError::ImportFormatInvalid(format!("not JSON: {err}")))?;

    match value {
        Value::Array(entries) => Ok(ImportPayload::Batch(
            entries
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|entry| checklist_from_object(entry, now_ms))
                .collect(),
        )),
        Value::Object(entry) => checklist_from_object(&entry, now_ms)
            .map(ImportPayload::Single)
            .ok_or_else(|| {
                TransferError::ImportFormatInvalid(
                    "expected a checklist with `name` and `tasks`".to_string(),
                )
            }),
        _ => Err(TransferError::ImportFormatInvalid(
            "expected a checklist object or an array of checklists".to_string(),
        )),
    }
}

fn checklist_from_object(entry: &Map<String, Value>, now_ms: i64) -> Option<Checklist> {
    let name = entry.get("name")?.as_str().filter(|name| !name.is_empty())?;
    let tasks = entry.get("tasks")?.as_array()?;
    Some(Checklist {
        id: fresh_id(),
        name: name.to_string(),
        tasks: tasks
            .iter()
            .filter_map(Value::as_object)
            .map(|task| task_from_object(task, now_ms))
            .collect(),
    })
}

fn task_from_object(task: &Map<String, Value>, now_ms: i64) -> Task {
    let id = match task.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => fresh_id(),
    };
    Task {
        id,
        text: string_field(task, "text").unwrap_or_default(),
        completed: task
            .get("completed")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        category: string_field(task, "category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        created_at: task
            .get("createdAt")
            .and_then(Value::as_i64)
            .unwrap_or(now_ms),
    }
}

fn string_field(task: &Map<String, Value>, key: &str) -> Option<String> {
    task.get(key).and_then(Value::as_str).map(str::to_string)
}
