//! Domain-gated sign-in plus the auth-state event channel.

use super::{AuthError, AuthResult, IdentityProvider};
use crate::model::identity::Identity;
use log::{error, info, warn};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Identity change published to the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateEvent {
    SignedIn(Identity),
    SignedOut,
}

impl AuthStateEvent {
    pub fn into_identity(self) -> Option<Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::SignedOut => None,
        }
    }
}

#[derive(Debug, Default)]
struct ChannelState {
    queue: VecDeque<AuthStateEvent>,
    open: bool,
}

type SharedChannel = Rc<RefCell<ChannelState>>;

/// Receiving end of the auth-state channel.
///
/// Dropping it (or calling `unsubscribe`) closes the channel.
#[derive(Debug)]
pub struct AuthSubscription {
    channel: SharedChannel,
}

impl AuthSubscription {
    /// Pops the oldest undelivered event.
    pub fn try_next(&self) -> Option<AuthStateEvent> {
        self.channel.borrow_mut().queue.pop_front()
    }

    /// Pops every undelivered event in order.
    pub fn drain(&self) -> Vec<AuthStateEvent> {
        self.channel.borrow_mut().queue.drain(..).collect()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        let mut channel = self.channel.borrow_mut();
        channel.open = false;
        channel.queue.clear();
    }
}

/// Wraps an identity provider with the domain allowlist.
pub struct AuthGateway<P: IdentityProvider> {
    provider: P,
    allowed_domain: String,
    channel: Option<SharedChannel>,
    last_emitted: Option<Option<Identity>>,
}

impl<P: IdentityProvider> AuthGateway<P> {
    pub fn new(provider: P, allowed_domain: impl Into<String>) -> Self {
        Self {
            provider,
            allowed_domain: allowed_domain.into(),
            channel: None,
            last_emitted: None,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// Provider session identity, if it passes the domain allowlist.
    pub fn current_identity(&self) -> Option<Identity> {
        self.allowed(self.provider.current_identity())
    }

    /// Opens the auth-state channel and queues the current state.
    ///
    /// # Errors
    /// - `AlreadySubscribed` while a previous subscription is still live.
    pub fn subscribe(&mut self) -> AuthResult<AuthSubscription> {
        if self
            .channel
            .as_ref()
            .is_some_and(|channel| channel.borrow().open)
        {
            return Err(AuthError::AlreadySubscribed);
        }

        let channel = Rc::new(RefCell::new(ChannelState {
            queue: VecDeque::new(),
            open: true,
        }));
        self.channel = Some(Rc::clone(&channel));
        let current = self.provider.current_identity();
        self.emit(current);
        Ok(AuthSubscription { channel })
    }

    /// Runs the provider flow and applies the domain allowlist.
    ///
    /// # Errors
    /// - `InvalidDomain` when the email does not end with the allowed domain;
    ///   the provider session is torn down before returning.
    /// - `AuthFailure` for any provider failure.
    pub fn sign_in(&mut self) -> AuthResult<Identity> {
        let provider_id = self.provider.provider_id().to_string();
        let identity = self.provider.sign_in_interactive().map_err(|failure| {
            error!(
                "event=sign_in module=auth status=error provider={provider_id} error_code={}",
                failure.code
            );
            AuthError::AuthFailure(failure)
        })?;

        if !identity.has_email_domain(&self.allowed_domain) {
            warn!(
                "event=sign_in module=auth status=error provider={provider_id} error_code=invalid_domain user_ref={}",
                identity.user_ref
            );
            if let Err(failure) = self.provider.sign_out() {
                warn!(
                    "event=sign_out module=auth status=error provider={provider_id} reason=invalid_domain_teardown error_code={}",
                    failure.code
                );
            }
            self.emit_if_changed(None);
            return Err(AuthError::InvalidDomain);
        }

        info!(
            "event=sign_in module=auth status=ok provider={provider_id} user_ref={}",
            identity.user_ref
        );
        self.emit_if_changed(Some(identity.clone()));
        Ok(identity)
    }

    /// Tears down the provider session.
    pub fn sign_out(&mut self) -> AuthResult<()> {
        self.provider.sign_out().map_err(|failure| {
            error!(
                "event=sign_out module=auth status=error provider={} error_code={}",
                self.provider.provider_id(),
                failure.code
            );
            AuthError::AuthFailure(failure)
        })?;
        info!(
            "event=sign_out module=auth status=ok provider={}",
            self.provider.provider_id()
        );
        self.emit_if_changed(None);
        Ok(())
    }

    /// Re-reads the provider session and publishes external changes such as
    /// expiry.
    pub fn refresh_session(&mut self) {
        let current = self.provider.current_identity();
        self.emit_if_changed(current);
    }

    /// Provider identities outside the allowed domain publish as signed out.
    fn allowed(&self, identity: Option<Identity>) -> Option<Identity> {
        identity.filter(|identity| identity.has_email_domain(&self.allowed_domain))
    }

    fn emit_if_changed(&mut self, identity: Option<Identity>) {
        let identity = self.allowed(identity);
        if self.last_emitted.as_ref() != Some(&identity) {
            self.emit(identity);
        }
    }

    fn emit(&mut self, identity: Option<Identity>) {
        let identity = self.allowed(identity);
        self.last_emitted = Some(identity.clone());
        let Some(channel) = &self.channel else {
            return;
        };
        let mut state = channel.borrow_mut();
        if !state.open {
            return;
        }
        state.queue.push_back(match identity {
            Some(identity) => AuthStateEvent::SignedIn(identity),
            None => AuthStateEvent::SignedOut,
        });
    }
}
