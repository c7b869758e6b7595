//! Local Store: synchronous key-value cache of the whole collection.
//!
//! # Responsibility
//! - Persist the checklist collection and active id under two string keys.
//! - Survive process restarts so state is available before sign-in.
//!
//! # Invariants
//! - `load` never fails; malformed or missing data reads as `None`.
//! - `save` is a write-through of the full state; last write wins.

use crate::db::migrations::table_exists;
use crate::db::{DbError, DbResult};
use crate::model::checklist::{Checklist, ChecklistCollection};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt::{Display, Formatter};

/// Key holding the serialized checklist array.
pub const CHECKLISTS_KEY: &str = "multi_checklist_app_data";
/// Key holding the active checklist id.
pub const ACTIVE_ID_KEY: &str = "active_checklist_id";

/// Synchronous persistence contract for cached collection state.
pub trait LocalStore {
    /// Reads cached state, or `None` when absent or unreadable.
    fn load(&self) -> Option<ChecklistCollection>;
    /// Mirrors the full collection and active id.
    fn save(&self, collection: &ChecklistCollection);
    /// Removes every cached key.
    fn clear(&self);
}

impl<T: LocalStore + ?Sized> LocalStore for &T {
    fn load(&self) -> Option<ChecklistCollection> {
        (**self).load()
    }

    fn save(&self, collection: &ChecklistCollection) {
        (**self).save(collection)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

#[derive(Debug)]
enum LocalStoreError {
    Db(DbError),
    Malformed(serde_json::Error),
}

impl Display for LocalStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Malformed(err) => write!(f, "malformed cached checklists: {err}"),
        }
    }
}

impl From<rusqlite::Error> for LocalStoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for LocalStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value)
    }
}

/// SQLite-backed local store over the `local_kv` table.
pub struct SqliteLocalStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLocalStore<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `SchemaNotReady` when `local_kv` does not exist.
    pub fn try_new(conn: &'conn Connection) -> DbResult<Self> {
        if !table_exists(conn, "local_kv")? {
            return Err(DbError::SchemaNotReady("local_kv"));
        }
        Ok(Self { conn })
    }

    fn read_value(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_kv WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn try_load(&self) -> Result<Option<ChecklistCollection>, LocalStoreError> {
        let Some(raw) = self.read_value(CHECKLISTS_KEY)? else {
            return Ok(None);
        };
        let lists: Vec<Checklist> = serde_json::from_str(&raw)?;
        let active_id = self.read_value(ACTIVE_ID_KEY)?;
        Ok(ChecklistCollection::new(lists, active_id.as_deref()).ok())
    }

    fn try_save(&self, collection: &ChecklistCollection) -> Result<(), LocalStoreError> {
        let payload = serde_json::to_string(collection.lists())?;
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in [
            (CHECKLISTS_KEY, payload.as_str()),
            (ACTIVE_ID_KEY, collection.active_id()),
        ] {
            tx.execute(
                "INSERT INTO local_kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn try_clear(&self) -> Result<(), LocalStoreError> {
        self.conn.execute(
            "DELETE FROM local_kv WHERE key IN (?1, ?2);",
            params![CHECKLISTS_KEY, ACTIVE_ID_KEY],
        )?;
        Ok(())
    }
}

impl LocalStore for SqliteLocalStore<'_> {
    fn load(&self) -> Option<ChecklistCollection> {
        match self.try_load() {
            Ok(Some(collection)) => {
                debug!(
                    "event=local_load module=local_store status=ok lists={}",
                    collection.len()
                );
                Some(collection)
            }
            Ok(None) => {
                debug!("event=local_load module=local_store status=skipped reason=absent");
                None
            }
            Err(err) => {
                warn!("event=local_load module=local_store status=error error={err}");
                None
            }
        }
    }

    fn save(&self, collection: &ChecklistCollection) {
        if let Err(err) = self.try_save(collection) {
            warn!("event=local_save module=local_store status=error error={err}");
        }
    }

    fn clear(&self) {
        if let Err(err) = self.try_clear() {
            warn!("event=local_clear module=local_store status=error error={err}");
        }
    }
}
