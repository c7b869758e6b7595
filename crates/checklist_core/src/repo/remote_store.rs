//! Remote Store: per-user document collection, one document per checklist.
//!
//! # Responsibility
//! - Read every checklist of one identity for hydration.
//! - Create/merge, partially update and delete single checklist documents.
//!
//! # Invariants
//! - Documents live at `users/{user_ref}/checklists/{checklist_id}`.
//! - Absent payload fields are left untouched by writes (merge, not replace).
//! - Every operation is attempted once; nothing here retries.
//!
//! # See also
//! - `sync::controller` for when each operation is issued.

use crate::db::migrations::table_exists;
use crate::db::{DbError, DbResult};
use crate::model::checklist::Checklist;
use crate::model::identity::Identity;
use crate::model::task::Task;
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Display name given to documents that carry no title.
pub const UNTITLED_CHECKLIST: &str = "Untitled list";

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote store failure.
#[derive(Debug)]
pub enum RemoteError {
    /// The store denied the write (access policy or missing document).
    WriteRejected { path: String, reason: String },
    /// Backend transport/storage failure.
    Db(DbError),
    /// A stored document could not be decoded.
    InvalidData(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriteRejected { path, reason } => {
                write!(f, "remote write rejected at `{path}`: {reason}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid remote document: {message}"),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::WriteRejected { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RemoteError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RemoteError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Partial document update; `None` fields are not written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistPatch {
    pub title: Option<String>,
    pub tasks: Option<Vec<Task>>,
    /// Unix epoch milliseconds.
    pub updated_at: Option<i64>,
}

impl ChecklistPatch {
    /// Full-content patch for one checklist stamped with `now_ms`.
    pub fn from_checklist(checklist: &Checklist, now_ms: i64) -> Self {
        Self {
            title: Some(checklist.name.clone()),
            tasks: Some(checklist.tasks.clone()),
            updated_at: Some(now_ms),
        }
    }
}

/// Raw stored document, including fields a `Checklist` does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChecklistDocument {
    pub id: String,
    pub title: Option<String>,
    pub tasks: Option<Vec<Task>>,
    pub updated_at: Option<i64>,
}

impl RemoteChecklistDocument {
    pub fn into_checklist(self) -> Checklist {
        Checklist {
            id: self.id,
            name: self
                .title
                .unwrap_or_else(|| UNTITLED_CHECKLIST.to_string()),
            tasks: self.tasks.unwrap_or_default(),
        }
    }
}

/// Returns the document path of one checklist.
pub fn document_path(user_ref: &str, checklist_id: &str) -> String {
    format!("users/{user_ref}/checklists/{checklist_id}")
}

/// Per-user checklist document store.
pub trait RemoteStore {
    /// Reads every checklist under the identity's partition.
    ///
    /// Returns an empty vector when none exist.
    fn fetch_all(&self, identity: &Identity) -> RemoteResult<Vec<Checklist>>;

    /// Creates or merges one document keyed by `checklist.id`.
    fn upsert_one(&self, identity: &Identity, checklist: &Checklist) -> RemoteResult<()>;

    /// Updates only the fields present in `patch`.
    ///
    /// No-op when `checklist_id` is empty.
    fn update_fields(
        &self,
        identity: &Identity,
        checklist_id: &str,
        patch: &ChecklistPatch,
    ) -> RemoteResult<()>;

    /// Removes one document.
    fn delete_one(&self, identity: &Identity, checklist_id: &str) -> RemoteResult<()>;

    /// Applies `upsert_one` sequentially.
    ///
    /// Not transactional: the first failure stops the batch and leaves
    /// earlier documents written.
    fn upsert_many(&self, identity: &Identity, checklists: &[Checklist]) -> RemoteResult<()> {
        for (written, checklist) in checklists.iter().enumerate() {
            if let Err(err) = self.upsert_one(identity, checklist) {
                warn!(
                    "event=remote_upsert_many module=remote_store status=error user_ref={} written={} total={} error={}",
                    identity.user_ref,
                    written,
                    checklists.len(),
                    err
                );
                return Err(err);
            }
        }
        Ok(())
    }
}

impl<T: RemoteStore + ?Sized> RemoteStore for &T {
    fn fetch_all(&self, identity: &Identity) -> RemoteResult<Vec<Checklist>> {
        (**self).fetch_all(identity)
    }

    fn upsert_one(&self, identity: &Identity, checklist: &Checklist) -> RemoteResult<()> {
        (**self).upsert_one(identity, checklist)
    }

    fn update_fields(
        &self,
        identity: &Identity,
        checklist_id: &str,
        patch: &ChecklistPatch,
    ) -> RemoteResult<()> {
        (**self).update_fields(identity, checklist_id, patch)
    }

    fn delete_one(&self, identity: &Identity, checklist_id: &str) -> RemoteResult<()> {
        (**self).delete_one(identity, checklist_id)
    }

    fn upsert_many(&self, identity: &Identity, checklists: &[Checklist]) -> RemoteResult<()> {
        (**self).upsert_many(identity, checklists)
    }
}

/// SQLite-backed document store over the `remote_checklists` table.
///
/// Write rules: partition and document keys must be non-blank and free of
/// `/`, and users placed on the deny list cannot write at all.
pub struct SqliteRemoteStore<'conn> {
    conn: &'conn Connection,
    denied_writers: RefCell<BTreeSet<String>>,
}

impl<'conn> SqliteRemoteStore<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `SchemaNotReady` when `remote_checklists` does not exist.
    pub fn try_new(conn: &'conn Connection) -> DbResult<Self> {
        if !table_exists(conn, "remote_checklists")? {
            return Err(DbError::SchemaNotReady("remote_checklists"));
        }
        Ok(Self {
            conn,
            denied_writers: RefCell::new(BTreeSet::new()),
        })
    }

    /// Rejects every later write from `user_ref`.
    pub fn deny_writes_for(&self, user_ref: &str) {
        self.denied_writers.borrow_mut().insert(user_ref.to_string());
    }

    /// Lifts a previous `deny_writes_for`.
    pub fn allow_writes_for(&self, user_ref: &str) {
        self.denied_writers.borrow_mut().remove(user_ref);
    }

    /// Reads one raw document, if present.
    pub fn get_document(
        &self,
        identity: &Identity,
        checklist_id: &str,
    ) -> RemoteResult<Option<RemoteChecklistDocument>> {
        let mut stmt = self.conn.prepare(
            "SELECT checklist_id, title, tasks_json, updated_at
             FROM remote_checklists
             WHERE user_ref = ?1 AND checklist_id = ?2;",
        )?;
        let raw = stmt
            .query_row(params![identity.user_ref, checklist_id], read_raw_document)
            .optional()?;
        raw.map(RawDocument::decode).transpose()
    }

    fn check_write(&self, identity: &Identity, checklist_id: &str) -> RemoteResult<()> {
        let path = document_path(&identity.user_ref, checklist_id);
        let reject = |reason: &str| {
            warn!(
                "event=remote_write module=remote_store status=error error_code=write_rejected user_ref={} checklist_id={} reason={}",
                identity.user_ref, checklist_id, reason
            );
            Err(RemoteError::WriteRejected {
                path: path.clone(),
                reason: reason.to_string(),
            })
        };

        if !is_valid_key(&identity.user_ref) {
            return reject("invalid user partition");
        }
        if !is_valid_key(checklist_id) {
            return reject("invalid checklist id");
        }
        if self.denied_writers.borrow().contains(&identity.user_ref) {
            return reject("permission denied");
        }
        Ok(())
    }
}

impl RemoteStore for SqliteRemoteStore<'_> {
    fn fetch_all(&self, identity: &Identity) -> RemoteResult<Vec<Checklist>> {
        let mut stmt = self.conn.prepare(
            "SELECT checklist_id, title, tasks_json, updated_at
             FROM remote_checklists
             WHERE user_ref = ?1
             ORDER BY checklist_id ASC;",
        )?;
        let mut rows = stmt.query([identity.user_ref.as_str()])?;
        let mut checklists = Vec::new();
        while let Some(row) = rows.next()? {
            let document = read_raw_document(row)?.decode()?;
            checklists.push(document.into_checklist());
        }

        info!(
            "event=remote_fetch_all module=remote_store status=ok user_ref={} count={}",
            identity.user_ref,
            checklists.len()
        );
        Ok(checklists)
    }

    fn upsert_one(&self, identity: &Identity, checklist: &Checklist) -> RemoteResult<()> {
        self.check_write(identity, &checklist.id)?;
        let tasks_json = encode_tasks(&checklist.tasks)?;
        self.conn.execute(
            "INSERT INTO remote_checklists (user_ref, checklist_id, title, tasks_json)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_ref, checklist_id) DO UPDATE SET
                title = excluded.title,
                tasks_json = excluded.tasks_json;",
            params![
                identity.user_ref,
                checklist.id,
                checklist.name,
                tasks_json
            ],
        )?;

        debug!(
            "event=remote_upsert module=remote_store status=ok user_ref={} checklist_id={}",
            identity.user_ref, checklist.id
        );
        Ok(())
    }

    fn update_fields(
        &self,
        identity: &Identity,
        checklist_id: &str,
        patch: &ChecklistPatch,
    ) -> RemoteResult<()> {
        if checklist_id.is_empty() {
            debug!("event=remote_update module=remote_store status=skipped reason=empty_id");
            return Ok(());
        }
        self.check_write(identity, checklist_id)?;

        let tasks_json = patch.tasks.as_deref().map(encode_tasks).transpose()?;
        let changed = self.conn.execute(
            "UPDATE remote_checklists
             SET
                title = COALESCE(?1, title),
                tasks_json = COALESCE(?2, tasks_json),
                updated_at = COALESCE(?3, updated_at)
             WHERE user_ref = ?4 AND checklist_id = ?5;",
            params![
                patch.title,
                tasks_json,
                patch.updated_at,
                identity.user_ref,
                checklist_id
            ],
        )?;

        if changed == 0 {
            warn!(
                "event=remote_update module=remote_store status=error error_code=write_rejected user_ref={} checklist_id={} reason=not_found",
                identity.user_ref, checklist_id
            );
            return Err(RemoteError::WriteRejected {
                path: document_path(&identity.user_ref, checklist_id),
                reason: "no document to update".to_string(),
            });
        }

        debug!(
            "event=remote_update module=remote_store status=ok user_ref={} checklist_id={}",
            identity.user_ref, checklist_id
        );
        Ok(())
    }

    fn delete_one(&self, identity: &Identity, checklist_id: &str) -> RemoteResult<()> {
        self.check_write(identity, checklist_id)?;
        let removed = self.conn.execute(
            "DELETE FROM remote_checklists WHERE user_ref = ?1 AND checklist_id = ?2;",
            params![identity.user_ref, checklist_id],
        )?;

        info!(
            "event=remote_delete module=remote_store status=ok user_ref={} checklist_id={} removed={}",
            identity.user_ref, checklist_id, removed
        );
        Ok(())
    }
}

struct RawDocument {
    id: String,
    title: Option<String>,
    tasks_json: Option<String>,
    updated_at: Option<i64>,
}

impl RawDocument {
    fn decode(self) -> RemoteResult<RemoteChecklistDocument> {
        let tasks = match self.tasks_json {
            Some(raw) => Some(serde_json::from_str::<Vec<Task>>(&raw).map_err(|err| {
                RemoteError::InvalidData(format!("tasks of checklist `{}`: {err}", self.id))
            })?),
            None => None,
        };
        Ok(RemoteChecklistDocument {
            id: self.id,
            title: self.title,
            tasks,
            updated_at: self.updated_at,
        })
    }
}

fn read_raw_document(row: &Row<'_>) -> rusqlite::Result<RawDocument> {
    Ok(RawDocument {
        id: row.get("checklist_id")?,
        title: row.get("title")?,
        tasks_json: row.get("tasks_json")?,
        updated_at: row.get("updated_at")?,
    })
}

fn encode_tasks(tasks: &[Task]) -> RemoteResult<String> {
    serde_json::to_string(tasks)
        .map_err(|err| RemoteError::InvalidData(format!("tasks are not serializable: {err}")))
}

fn is_valid_key(value: &str) -> bool {
    !value.trim().is_empty() && !value.contains('/')
}
