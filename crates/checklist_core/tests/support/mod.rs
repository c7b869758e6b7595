#![allow(dead_code)]

use checklist_core::{
    Checklist, ChecklistPatch, Identity, RemoteError, RemoteResult, RemoteStore,
    SqliteRemoteStore, Task,
};
use rusqlite::Connection;
use std::cell::{Cell, RefCell};

pub const ALLOWED_DOMAIN: &str = "q4inc.com";

pub fn member(user_ref: &str) -> Identity {
    Identity::new(user_ref, format!("{user_ref}@{ALLOWED_DOMAIN}"))
}

pub fn outsider(user_ref: &str) -> Identity {
    Identity::new(user_ref, format!("{user_ref}@gmail.com"))
}

pub fn checklist(id: &str, name: &str, texts: &[&str]) -> Checklist {
    Checklist {
        id: id.to_string(),
        name: name.to_string(),
        tasks: texts
            .iter()
            .enumerate()
            .map(|(index, text)| Task::with_id(format!("{id}-{index}"), *text, 1))
            .collect(),
    }
}

/// SQLite remote store that records every call made through it.
pub struct RecordingRemote<'conn> {
    pub inner: SqliteRemoteStore<'conn>,
    fetches: Cell<usize>,
    fail_fetch: Cell<bool>,
    updates: RefCell<Vec<(String, ChecklistPatch)>>,
    upserts: RefCell<Vec<String>>,
    deletes: RefCell<Vec<String>>,
}

impl<'conn> RecordingRemote<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteRemoteStore::try_new(conn).unwrap(),
            fetches: Cell::new(0),
            fail_fetch: Cell::new(false),
            updates: RefCell::new(Vec::new()),
            upserts: RefCell::new(Vec::new()),
            deletes: RefCell::new(Vec::new()),
        }
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetch.set(fail);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    pub fn updates(&self) -> Vec<(String, ChecklistPatch)> {
        self.updates.borrow().clone()
    }

    pub fn upserts(&self) -> Vec<String> {
        self.upserts.borrow().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.borrow().clone()
    }

    pub fn reset_calls(&self) {
        self.updates.borrow_mut().clear();
        self.upserts.borrow_mut().clear();
        self.deletes.borrow_mut().clear();
    }
}

impl RemoteStore for RecordingRemote<'_> {
    fn fetch_all(&self, identity: &Identity) -> RemoteResult<Vec<Checklist>> {
        self.fetches.set(self.fetches.get() + 1);
        if self.fail_fetch.get() {
            return Err(RemoteError::InvalidData("backend unavailable".to_string()));
        }
        self.inner.fetch_all(identity)
    }

    fn upsert_one(&self, identity: &Identity, checklist: &Checklist) -> RemoteResult<()> {
        self.upserts.borrow_mut().push(checklist.id.clone());
        self.inner.upsert_one(identity, checklist)
    }

    fn update_fields(
        &self,
        identity: &Identity,
        checklist_id: &str,
        patch: &ChecklistPatch,
    ) -> RemoteResult<()> {
        self.updates
            .borrow_mut()
            .push((checklist_id.to_string(), patch.clone()));
        self.inner.update_fields(identity, checklist_id, patch)
    }

    fn delete_one(&self, identity: &Identity, checklist_id: &str) -> RemoteResult<()> {
        self.deletes.borrow_mut().push(checklist_id.to_string());
        self.inner.delete_one(identity, checklist_id)
    }
}
