//! Reconciliation controller: the application state holder.
//!
//! # Responsibility
//! - Own `AppState` and apply editor actions through the reducer.
//! - Decide when the remote store is read and written.
//!
//! # Invariants
//! - Rejected actions are neither mirrored nor synced.
//! - Remote writes only happen in `AuthPhase::Steady`.
//! - A pending debounced write is bound to the identity that scheduled it;
//!   identity change cancels it.

use super::clock::Clock;
use super::debounce::Debouncer;
use crate::auth::AuthError;
use crate::config::SyncConfig;
use crate::model::checklist::ChecklistCollection;
use crate::model::identity::Identity;
use crate::model::ChecklistError;
use crate::repo::local_store::LocalStore;
use crate::repo::remote_store::{ChecklistPatch, RemoteError, RemoteStore};
use crate::state::reducer::reduce;
use crate::state::{Action, AppState, AuthPhase, Effect, SessionState};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ControllerResult<T> = Result<T, ControllerError>;

#[derive(Debug)]
pub enum ControllerError {
    /// Action rejected by a collection invariant; nothing was applied.
    Checklist(ChecklistError),
    /// Remote call failed; any local mutation stays applied.
    Remote(RemoteError),
    Auth(AuthError),
    /// Operation needs a synced session.
    NotSignedIn,
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checklist(err) => write!(f, "{err}"),
            Self::Remote(err) => write!(f, "{err}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::NotSignedIn => write!(f, "no signed-in session with remote sync"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Checklist(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::Auth(err) => Some(err),
            Self::NotSignedIn => None,
        }
    }
}

impl From<ChecklistError> for ControllerError {
    fn from(value: ChecklistError) -> Self {
        Self::Checklist(value)
    }
}

impl From<RemoteError> for ControllerError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<AuthError> for ControllerError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

/// Debounced field update waiting for its quiet period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub user_ref: String,
    pub checklist_id: String,
}

/// Result of processing one auth-state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// Remote lists replaced the in-memory collection.
    Replaced { count: usize },
    /// Remote was empty; local lists were kept and uploaded.
    Seeded { count: usize },
    /// Same identity is already synced.
    Unchanged,
    /// Identity failed the domain allowlist and was treated as absent.
    DomainRejected,
    SignedOut,
}

pub struct ReconciliationController<L: LocalStore, R: RemoteStore, C: Clock> {
    state: AppState,
    local: L,
    remote: R,
    clock: C,
    config: SyncConfig,
    debouncer: Debouncer<PendingWrite>,
}

impl<L: LocalStore, R: RemoteStore, C: Clock> ReconciliationController<L, R, C> {
    /// Loads cached state, falling back to the seed collection.
    pub fn new(local: L, remote: R, clock: C, config: SyncConfig) -> Self {
        let collection = match local.load() {
            Some(collection) => collection,
            None => {
                info!("event=state_init module=sync status=ok source=seed");
                ChecklistCollection::seed(clock.now_ms())
            }
        };
        Self {
            state: AppState::new(collection),
            debouncer: Debouncer::new(config.debounce_ms),
            local,
            remote,
            clock,
            config,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn collection(&self) -> &ChecklistCollection {
        &self.state.collection
    }

    pub fn session(&self) -> &SessionState {
        &self.state.session
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn pending_write(&self) -> Option<&PendingWrite> {
        self.debouncer.pending()
    }

    /// Deadline of the pending debounced write, for event-loop scheduling.
    pub fn next_deadline_ms(&self) -> Option<i64> {
        self.debouncer.deadline_ms()
    }

    /// Reacts to an auth-state change.
    ///
    /// A new allowed identity triggers hydration; absent or disallowed
    /// identities end the session but leave the collection in memory.
    ///
    /// # Errors
    /// - `Remote` when the hydration read fails; the session moves to
    ///   `AuthPhase::HydrationFailed` and local state is untouched.
    pub fn handle_auth_state(
        &mut self,
        identity: Option<Identity>,
    ) -> ControllerResult<HydrationOutcome> {
        let Some(identity) = identity else {
            self.end_session();
            return Ok(HydrationOutcome::SignedOut);
        };

        if !identity.has_email_domain(&self.config.allowed_domain) {
            warn!(
                "event=auth_state module=sync status=skipped reason=invalid_domain user_ref={}",
                identity.user_ref
            );
            self.end_session();
            return Ok(HydrationOutcome::DomainRejected);
        }

        if let SessionState::Authenticated {
            identity: current,
            phase: AuthPhase::Steady,
        } = &self.state.session
        {
            if current.user_ref == identity.user_ref {
                return Ok(HydrationOutcome::Unchanged);
            }
        }

        self.cancel_pending("identity_changed");
        self.hydrate(identity)
    }

    /// Retries hydration for the current identity on explicit request.
    pub fn rehydrate(&mut self) -> ControllerResult<HydrationOutcome> {
        let Some(identity) = self.state.session.identity().cloned() else {
            return Err(ControllerError::NotSignedIn);
        };
        self.cancel_pending("rehydrate");
        self.hydrate(identity)
    }

    /// Applies one editor action, mirrors it locally, then runs its effect.
    ///
    /// # Errors
    /// - `Checklist` when the action is rejected (nothing applied).
    /// - `Remote` when an immediate remote write fails (local change kept).
    pub fn dispatch(&mut self, action: Action) -> ControllerResult<()> {
        let now_ms = self.clock.now_ms();
        let effect = reduce(&mut self.state.collection, action, now_ms).map_err(|err| {
            debug!("event=dispatch module=sync status=skipped reason=rejected error={err}");
            err
        })?;
        self.local.save(&self.state.collection);
        self.run_effect(effect)
    }

    /// Fires the debounced write once its quiet period has elapsed.
    ///
    /// Returns the id of the checklist written, if any.
    pub fn tick(&mut self) -> ControllerResult<Option<String>> {
        match self.debouncer.poll(self.clock.now_ms()) {
            Some(pending) => self.write_pending(pending),
            None => Ok(None),
        }
    }

    /// Fires the pending debounced write immediately.
    pub fn flush(&mut self) -> ControllerResult<Option<String>> {
        match self.debouncer.cancel() {
            Some(pending) => self.write_pending(pending),
            None => Ok(None),
        }
    }

    /// Explicit bulk save of the whole collection.
    ///
    /// # Errors
    /// - `NotSignedIn` outside a synced session.
    /// - `Remote` on the first failed document; earlier ones stay written.
    pub fn save_all(&mut self) -> ControllerResult<()> {
        let identity = self
            .state
            .session
            .sync_identity()
            .cloned()
            .ok_or(ControllerError::NotSignedIn)?;
        self.cancel_pending("bulk_save");
        self.upload_all(&identity)
    }

    /// Removes cached state from the local store; memory is untouched.
    pub fn clear_local_store(&self) {
        self.local.clear();
        info!("event=local_clear module=sync status=ok");
    }

    fn hydrate(&mut self, identity: Identity) -> ControllerResult<HydrationOutcome> {
        info!(
            "event=hydrate module=sync status=start user_ref={}",
            identity.user_ref
        );
        self.state.session = SessionState::Authenticated {
            identity: identity.clone(),
            phase: AuthPhase::Hydrating,
        };

        let remote_lists = match self.remote.fetch_all(&identity) {
            Ok(lists) => lists,
            Err(err) => {
                error!(
                    "event=hydrate module=sync status=error user_ref={} error={}",
                    identity.user_ref, err
                );
                self.set_phase(AuthPhase::HydrationFailed);
                return Err(err.into());
            }
        };

        if remote_lists.is_empty() {
            self.set_phase(AuthPhase::Steady);
            let count = self.state.collection.len();
            info!(
                "event=hydrate module=sync status=ok user_ref={} source=local count={}",
                identity.user_ref, count
            );
            self.upload_all(&identity)?;
            return Ok(HydrationOutcome::Seeded { count });
        }

        let count = remote_lists.len();
        reduce(
            &mut self.state.collection,
            Action::ReplaceAll(remote_lists),
            self.clock.now_ms(),
        )?;
        self.local.save(&self.state.collection);
        self.set_phase(AuthPhase::Steady);
        info!(
            "event=hydrate module=sync status=ok user_ref={} source=remote count={}",
            identity.user_ref, count
        );
        Ok(HydrationOutcome::Replaced { count })
    }

    fn run_effect(&mut self, effect: Effect) -> ControllerResult<()> {
        match effect {
            Effect::None => Ok(()),
            Effect::ScheduleActiveSync { checklist_id } => {
                if let Some(identity) = self.state.session.sync_identity() {
                    let pending = PendingWrite {
                        user_ref: identity.user_ref.clone(),
                        checklist_id,
                    };
                    self.debouncer.schedule(self.clock.now_ms(), pending);
                }
                Ok(())
            }
            Effect::SyncAll => {
                self.cancel_pending("structural_change");
                match self.state.session.sync_identity().cloned() {
                    Some(identity) => self.upload_all(&identity),
                    None => Ok(()),
                }
            }
            Effect::ActiveChanged { .. } => self.flush().map(|_| ()),
            Effect::Removed { checklist_id } => {
                if self
                    .debouncer
                    .pending()
                    .is_some_and(|pending| pending.checklist_id == checklist_id)
                {
                    self.cancel_pending("checklist_removed");
                }
                let Some(identity) = self.state.session.sync_identity() else {
                    return Ok(());
                };
                if self.config.delete_remote_on_local_delete {
                    self.remote.delete_one(identity, &checklist_id)?;
                }
                Ok(())
            }
        }
    }

    fn write_pending(&mut self, pending: PendingWrite) -> ControllerResult<Option<String>> {
        let Some(identity) = self.state.session.sync_identity() else {
            debug!("event=debounced_write module=sync status=skipped reason=not_synced");
            return Ok(None);
        };
        if identity.user_ref != pending.user_ref {
            warn!(
                "event=debounced_write module=sync status=skipped reason=identity_changed user_ref={}",
                pending.user_ref
            );
            return Ok(None);
        }
        let Some(checklist) = self.state.collection.get(&pending.checklist_id) else {
            debug!(
                "event=debounced_write module=sync status=skipped reason=checklist_missing checklist_id={}",
                pending.checklist_id
            );
            return Ok(None);
        };

        let patch = ChecklistPatch::from_checklist(checklist, self.clock.now_ms());
        if let Err(err) = self
            .remote
            .update_fields(identity, &pending.checklist_id, &patch)
        {
            error!(
                "event=debounced_write module=sync status=error user_ref={} checklist_id={} error={}",
                pending.user_ref, pending.checklist_id, err
            );
            return Err(err.into());
        }

        info!(
            "event=debounced_write module=sync status=ok user_ref={} checklist_id={}",
            pending.user_ref, pending.checklist_id
        );
        Ok(Some(pending.checklist_id))
    }

    fn upload_all(&self, identity: &Identity) -> ControllerResult<()> {
        self.remote
            .upsert_many(identity, self.state.collection.lists())?;
        info!(
            "event=upload_all module=sync status=ok user_ref={} count={}",
            identity.user_ref,
            self.state.collection.len()
        );
        Ok(())
    }

    fn end_session(&mut self) {
        self.cancel_pending("signed_out");
        if self.state.session != SessionState::Unauthenticated {
            info!("event=auth_state module=sync status=ok session=unauthenticated");
        }
        self.state.session = SessionState::Unauthenticated;
    }

    fn cancel_pending(&mut self, reason: &str) {
        if let Some(pending) = self.debouncer.cancel() {
            info!(
                "event=debounced_write module=sync status=cancelled reason={reason} checklist_id={}",
                pending.checklist_id
            );
        }
    }

    fn set_phase(&mut self, next: AuthPhase) {
        if let SessionState::Authenticated { phase, .. } = &mut self.state.session {
            *phase = next;
        }
    }
}
