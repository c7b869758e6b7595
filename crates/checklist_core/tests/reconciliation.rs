mod support;

use checklist_core::db::open_db_in_memory;
use checklist_core::model::checklist::SEED_CHECKLIST_ID;
use checklist_core::{
    Action, AuthPhase, ChecklistError, ControllerError, HydrationOutcome, LocalStore,
    ManualClock, ReconciliationController, RemoteError, RemoteStore, SessionState,
    SqliteLocalStore, SyncConfig,
};
use support::{checklist, member, outsider, RecordingRemote};

const DEBOUNCE_MS: i64 = 1_500;

type Controller<'a> =
    ReconciliationController<&'a SqliteLocalStore<'a>, &'a RecordingRemote<'a>, &'a ManualClock>;

fn edit(task_id: &str, text: &str) -> Action {
    Action::EditTaskText {
        task_id: task_id.to_string(),
        text: text.to_string(),
    }
}

#[test]
fn startup_without_cache_uses_seed_and_waits_for_auth() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(1_000);

    let controller: Controller<'_> =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());

    assert_eq!(controller.session(), &SessionState::Resolving);
    assert_eq!(controller.collection().active_id(), SEED_CHECKLIST_ID);
    assert_eq!(controller.collection().active().tasks.len(), 2);
}

#[test]
fn startup_restores_cached_state() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(1_000);

    let mut first = ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    first.dispatch(Action::CreateList).unwrap();
    let created_id = first.collection().active_id().to_string();
    drop(first);

    let second = ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    assert_eq!(second.collection().len(), 2);
    assert_eq!(second.collection().active_id(), created_id);
}

#[test]
fn sign_in_replaces_local_lists_with_remote_ones() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(1_000);
    let ana = member("ana");
    remote
        .inner
        .upsert_many(
            &ana,
            &[checklist("r2", "Work", &["ship"]), checklist("r1", "Home", &[])],
        )
        .unwrap();

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    let outcome = controller.handle_auth_state(Some(ana.clone())).unwrap();

    assert_eq!(outcome, HydrationOutcome::Replaced { count: 2 });
    assert_eq!(controller.collection().len(), 2);
    assert!(!controller.collection().contains(SEED_CHECKLIST_ID));
    assert_eq!(controller.collection().active_id(), "r1");
    assert_eq!(
        controller.session(),
        &SessionState::Authenticated {
            identity: ana,
            phase: AuthPhase::Steady
        }
    );
    assert_eq!(local.load().unwrap(), *controller.collection());
}

#[test]
fn empty_remote_keeps_local_lists_and_uploads_them() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(1_000);
    let ana = member("ana");

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    let before = controller.collection().clone();
    let outcome = controller.handle_auth_state(Some(ana.clone())).unwrap();

    assert_eq!(outcome, HydrationOutcome::Seeded { count: 1 });
    assert_eq!(*controller.collection(), before);
    let uploaded = remote.inner.fetch_all(&ana).unwrap();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0].id, SEED_CHECKLIST_ID);
}

#[test]
fn repeated_callback_for_same_identity_does_not_rehydrate() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(1_000);

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    controller.handle_auth_state(Some(member("ana"))).unwrap();
    let outcome = controller.handle_auth_state(Some(member("ana"))).unwrap();

    assert_eq!(outcome, HydrationOutcome::Unchanged);
    assert_eq!(remote.fetch_count(), 1);
}

#[test]
fn disallowed_identity_is_treated_as_signed_out_without_fetch() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(1_000);

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    let outcome = controller.handle_auth_state(Some(outsider("eve"))).unwrap();

    assert_eq!(outcome, HydrationOutcome::DomainRejected);
    assert_eq!(controller.session(), &SessionState::Unauthenticated);
    assert_eq!(remote.fetch_count(), 0);
}

#[test]
fn rapid_edits_collapse_into_one_remote_write_with_final_text() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(10_000);
    let ana = member("ana");

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    controller.handle_auth_state(Some(ana.clone())).unwrap();

    controller.dispatch(edit("1", "draft")).unwrap();
    clock.advance(500);
    controller.dispatch(edit("1", "final")).unwrap();

    clock.advance(DEBOUNCE_MS - 1);
    assert_eq!(controller.tick().unwrap(), None);
    clock.advance(1);
    assert_eq!(
        controller.tick().unwrap(),
        Some(SEED_CHECKLIST_ID.to_string())
    );
    clock.advance(DEBOUNCE_MS * 2);
    assert_eq!(controller.tick().unwrap(), None);

    let updates = remote.updates();
    assert_eq!(updates.len(), 1);
    let (checklist_id, patch) = &updates[0];
    assert_eq!(checklist_id, SEED_CHECKLIST_ID);
    assert_eq!(patch.tasks.as_ref().unwrap()[0].text, "final");
    assert_eq!(patch.title.as_deref(), Some("My Tasks"));
    assert_eq!(patch.updated_at, Some(10_000 + 500 + DEBOUNCE_MS));

    let document = remote
        .inner
        .get_document(&ana, SEED_CHECKLIST_ID)
        .unwrap()
        .unwrap();
    assert_eq!(document.tasks.unwrap()[0].text, "final");
}

#[test]
fn every_mutation_is_mirrored_locally_even_when_signed_out() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    controller.handle_auth_state(None).unwrap();
    controller
        .dispatch(Action::AddTask {
            text: "offline task".to_string(),
        })
        .unwrap();

    assert!(controller.pending_write().is_none());
    let cached = local.load().unwrap();
    assert_eq!(cached.active().tasks.last().unwrap().text, "offline task");
    assert!(remote.upserts().is_empty());
}

#[test]
fn rejected_action_is_not_mirrored() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    let err = controller
        .dispatch(Action::DeleteList {
            checklist_id: SEED_CHECKLIST_ID.to_string(),
        })
        .unwrap_err();

    assert!(matches!(
        err,
        ControllerError::Checklist(ChecklistError::LastChecklist)
    ));
    assert_eq!(controller.collection().len(), 1);
    assert!(local.load().is_none());
}

#[test]
fn creating_a_list_uploads_whole_collection_immediately() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);
    let ana = member("ana");

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    controller.handle_auth_state(Some(ana.clone())).unwrap();
    controller.dispatch(edit("1", "pending edit")).unwrap();
    remote.reset_calls();

    controller.dispatch(Action::CreateList).unwrap();

    assert!(controller.pending_write().is_none());
    assert_eq!(remote.upserts().len(), 2);
    let stored = remote.inner.fetch_all(&ana).unwrap();
    assert_eq!(stored.len(), 2);
    let seed = stored
        .iter()
        .find(|list| list.id == SEED_CHECKLIST_ID)
        .unwrap();
    assert_eq!(seed.tasks[0].text, "pending edit");
}

#[test]
fn switching_lists_flushes_pending_write_for_previous_list() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    controller.handle_auth_state(Some(member("ana"))).unwrap();
    controller.dispatch(Action::CreateList).unwrap();
    let created_id = controller.collection().active_id().to_string();
    controller
        .dispatch(Action::RenameActive {
            name: "Errands".to_string(),
        })
        .unwrap();

    controller
        .dispatch(Action::SelectList {
            checklist_id: SEED_CHECKLIST_ID.to_string(),
        })
        .unwrap();

    assert!(controller.pending_write().is_none());
    let updates = remote.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, created_id);
    assert_eq!(updates[0].1.title.as_deref(), Some("Errands"));
}

#[test]
fn deleting_a_list_leaves_remote_document_by_default() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);
    let ana = member("ana");

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    controller.handle_auth_state(Some(ana.clone())).unwrap();
    controller.dispatch(Action::CreateList).unwrap();
    let created_id = controller.collection().active_id().to_string();
    controller.dispatch(edit_name("Short lived")).unwrap();

    controller
        .dispatch(Action::DeleteList {
            checklist_id: created_id.clone(),
        })
        .unwrap();

    assert!(controller.pending_write().is_none());
    assert_eq!(controller.collection().active_id(), SEED_CHECKLIST_ID);
    assert!(remote.deletes().is_empty());
    assert!(remote.inner.get_document(&ana, &created_id).unwrap().is_some());
}

#[test]
fn deleting_a_list_removes_remote_document_when_configured() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);
    let ana = member("ana");
    let config = SyncConfig {
        delete_remote_on_local_delete: true,
        ..SyncConfig::default()
    };

    let mut controller = ReconciliationController::new(&local, &remote, &clock, config);
    controller.handle_auth_state(Some(ana.clone())).unwrap();
    controller.dispatch(Action::CreateList).unwrap();
    let created_id = controller.collection().active_id().to_string();

    controller
        .dispatch(Action::DeleteList {
            checklist_id: created_id.clone(),
        })
        .unwrap();

    assert_eq!(remote.deletes(), vec![created_id.clone()]);
    assert!(remote.inner.get_document(&ana, &created_id).unwrap().is_none());
}

#[test]
fn remote_write_failure_keeps_local_mutation() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    controller.handle_auth_state(Some(member("ana"))).unwrap();
    remote.inner.deny_writes_for("ana");

    controller.dispatch(edit("2", "still saved locally")).unwrap();
    clock.advance(DEBOUNCE_MS);
    let err = controller.tick().unwrap_err();

    assert!(matches!(
        err,
        ControllerError::Remote(RemoteError::WriteRejected { .. })
    ));
    assert_eq!(
        controller.collection().active().task("2").unwrap().text,
        "still saved locally"
    );
    assert_eq!(
        local.load().unwrap().active().task("2").unwrap().text,
        "still saved locally"
    );
    assert_eq!(controller.tick().unwrap(), None);
}

#[test]
fn sign_out_cancels_pending_write() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    controller.handle_auth_state(Some(member("ana"))).unwrap();
    controller.dispatch(edit("1", "unsent")).unwrap();
    assert!(controller.pending_write().is_some());

    controller.handle_auth_state(None).unwrap();
    clock.advance(DEBOUNCE_MS);

    assert_eq!(controller.tick().unwrap(), None);
    assert!(remote.updates().is_empty());
    assert_eq!(controller.session(), &SessionState::Unauthenticated);
    assert_eq!(
        controller.collection().active().task("1").unwrap().text,
        "unsent"
    );
}

#[test]
fn identity_switch_cancels_pending_write_of_previous_user() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    controller.handle_auth_state(Some(member("ana"))).unwrap();
    controller.dispatch(edit("1", "ana's edit")).unwrap();

    controller.handle_auth_state(Some(member("bob"))).unwrap();
    clock.advance(DEBOUNCE_MS);

    assert_eq!(controller.tick().unwrap(), None);
    assert!(remote.updates().is_empty());
}

#[test]
fn hydration_failure_keeps_local_state_and_suspends_remote_writes() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);
    let ana = member("ana");

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    remote.fail_fetches(true);
    let err = controller.handle_auth_state(Some(ana.clone())).unwrap_err();

    assert!(matches!(err, ControllerError::Remote(_)));
    assert_eq!(
        controller.session(),
        &SessionState::Authenticated {
            identity: ana.clone(),
            phase: AuthPhase::HydrationFailed
        }
    );
    assert_eq!(controller.collection().active_id(), SEED_CHECKLIST_ID);

    controller.dispatch(edit("1", "local only")).unwrap();
    assert!(controller.pending_write().is_none());
    assert!(matches!(
        controller.save_all(),
        Err(ControllerError::NotSignedIn)
    ));

    remote.fail_fetches(false);
    let outcome = controller.rehydrate().unwrap();
    assert_eq!(outcome, HydrationOutcome::Seeded { count: 1 });
    assert_eq!(
        remote.inner.fetch_all(&ana).unwrap()[0].tasks[0].text,
        "local only"
    );
}

#[test]
fn reorder_changes_only_task_order() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    let before = controller.collection().active().tasks.clone();

    controller
        .dispatch(Action::ReorderTask {
            dragged_id: "2".to_string(),
            target_id: "1".to_string(),
        })
        .unwrap();

    let after = &controller.collection().active().tasks;
    assert_eq!(after.len(), before.len());
    assert_eq!(after[0], before[1]);
    assert_eq!(after[1], before[0]);
}

#[test]
fn explicit_bulk_save_writes_every_list() {
    let conn = open_db_in_memory().unwrap();
    let local = SqliteLocalStore::try_new(&conn).unwrap();
    let remote = RecordingRemote::new(&conn);
    let clock = ManualClock::new(0);
    let ana = member("ana");

    let mut controller =
        ReconciliationController::new(&local, &remote, &clock, SyncConfig::default());
    assert!(matches!(
        controller.save_all(),
        Err(ControllerError::NotSignedIn)
    ));

    controller.handle_auth_state(Some(ana.clone())).unwrap();
    controller.dispatch(Action::ResetChecks).unwrap();
    remote.reset_calls();
    controller.save_all().unwrap();

    assert!(controller.pending_write().is_none());
    assert_eq!(remote.upserts(), vec![SEED_CHECKLIST_ID.to_string()]);
}

fn edit_name(name: &str) -> Action {
    Action::RenameActive {
        name: name.to_string(),
    }
}
