//! Application shell wiring the auth gateway to the reconciliation
//! controller.
//!
//! # Responsibility
//! - Own the single auth-state subscription for the app lifetime.
//! - Route identity events to the controller in arrival order.
//! - Apply sign-out side effects (local cache clearing).

use crate::auth::{AuthGateway, AuthSubscription, IdentityProvider};
use crate::config::SyncConfig;
use crate::model::identity::Identity;
use crate::repo::local_store::LocalStore;
use crate::repo::remote_store::RemoteStore;
use crate::sync::clock::Clock;
use crate::sync::controller::{ControllerResult, HydrationOutcome, ReconciliationController};
use log::info;

pub struct ChecklistApp<P, L, R, C>
where
    P: IdentityProvider,
    L: LocalStore,
    R: RemoteStore,
    C: Clock,
{
    gateway: AuthGateway<P>,
    subscription: Option<AuthSubscription>,
    controller: ReconciliationController<L, R, C>,
}

impl<P, L, R, C> ChecklistApp<P, L, R, C>
where
    P: IdentityProvider,
    L: LocalStore,
    R: RemoteStore,
    C: Clock,
{
    pub fn new(provider: P, local: L, remote: R, clock: C, config: SyncConfig) -> Self {
        let gateway = AuthGateway::new(provider, config.allowed_domain.clone());
        Self {
            gateway,
            subscription: None,
            controller: ReconciliationController::new(local, remote, clock, config),
        }
    }

    pub fn gateway(&self) -> &AuthGateway<P> {
        &self.gateway
    }

    pub fn controller(&self) -> &ReconciliationController<L, R, C> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ReconciliationController<L, R, C> {
        &mut self.controller
    }

    /// Subscribes to auth state and resolves the initial session.
    pub fn start(&mut self) -> ControllerResult<Vec<HydrationOutcome>> {
        if self.subscription.is_none() {
            self.subscription = Some(self.gateway.subscribe()?);
            info!("event=app_start module=app status=ok");
        }
        self.pump_auth_events()
    }

    /// Delivers queued auth events to the controller.
    ///
    /// Stops at the first controller error; later events stay queued.
    pub fn pump_auth_events(&mut self) -> ControllerResult<Vec<HydrationOutcome>> {
        let mut outcomes = Vec::new();
        let Some(subscription) = &self.subscription else {
            return Ok(outcomes);
        };
        while let Some(event) = subscription.try_next() {
            outcomes.push(self.controller.handle_auth_state(event.into_identity())?);
        }
        Ok(outcomes)
    }

    /// Signs in through the gateway and processes the resulting events.
    ///
    /// # Errors
    /// - `Auth(InvalidDomain)` leaves the session unauthenticated and skips
    ///   hydration, including when another account was signed in before.
    pub fn sign_in(&mut self) -> ControllerResult<Identity> {
        let identity = match self.gateway.sign_in() {
            Ok(identity) => identity,
            Err(err) => {
                // A rejected account may have ended an active session.
                self.pump_auth_events()?;
                return Err(err.into());
            }
        };
        self.pump_auth_events()?;
        Ok(identity)
    }

    /// Signs out, clearing the local cache when configured.
    pub fn sign_out(&mut self) -> ControllerResult<()> {
        self.gateway.sign_out()?;
        if self.controller.config().clear_local_on_sign_out {
            self.controller.clear_local_store();
        }
        self.pump_auth_events()?;
        Ok(())
    }

    /// Publishes provider-side session changes such as expiry.
    pub fn refresh_session(&mut self) -> ControllerResult<Vec<HydrationOutcome>> {
        self.gateway.refresh_session();
        self.pump_auth_events()
    }

    /// Closes the auth subscription.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            info!("event=app_shutdown module=app status=ok");
        }
    }
}
