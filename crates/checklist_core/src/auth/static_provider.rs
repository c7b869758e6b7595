//! Offline provider with one preconfigured account.
//!
//! Used by the CLI and local tooling where no federated popup exists.

use super::{IdentityProvider, ProviderFailure};
use crate::model::identity::Identity;
use std::cell::Cell;

#[derive(Debug)]
pub struct StaticIdentityProvider {
    identity: Identity,
    signed_in: Cell<bool>,
}

impl StaticIdentityProvider {
    /// Starts without a session.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            signed_in: Cell::new(false),
        }
    }

    /// Starts with an already restored session.
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity,
            signed_in: Cell::new(true),
        }
    }

    /// Simulates provider-side expiry.
    pub fn expire(&self) {
        self.signed_in.set(false);
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn provider_id(&self) -> &str {
        "static"
    }

    fn current_identity(&self) -> Option<Identity> {
        self.signed_in.get().then(|| self.identity.clone())
    }

    fn sign_in_interactive(&self) -> Result<Identity, ProviderFailure> {
        if self.identity.user_ref.trim().is_empty() {
            return Err(ProviderFailure::new(
                "invalid_account",
                "configured account has no user reference",
            ));
        }
        self.signed_in.set(true);
        Ok(self.identity.clone())
    }

    fn sign_out(&self) -> Result<(), ProviderFailure> {
        self.signed_in.set(false);
        Ok(())
    }
}
