//! Auth gateway over a federated identity provider.
//!
//! # Responsibility
//! - Define the provider seam (`IdentityProvider`).
//! - Enforce the email-domain allowlist at sign-in.
//! - Publish identity changes through a single subscription channel.
//!
//! # Invariants
//! - A rejected domain never produces a signed-in event.
//! - At most one subscription is live at a time.

pub mod gateway;
pub mod static_provider;

use crate::model::identity::Identity;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use gateway::{AuthGateway, AuthStateEvent, AuthSubscription};
pub use static_provider::StaticIdentityProvider;

pub type AuthResult<T> = Result<T, AuthError>;

/// Provider-reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Stable machine-readable code (`popup_closed`, `network`, ...).
    pub code: String,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl Display for ProviderFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for ProviderFailure {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Signed-in email is outside the allowed domain.
    InvalidDomain,
    /// Any other provider-level failure.
    AuthFailure(ProviderFailure),
    /// A subscription is already live.
    AlreadySubscribed,
}

impl AuthError {
    /// Stable signal shown to presentation code.
    pub fn signal(&self) -> &'static str {
        match self {
            Self::InvalidDomain => "INVALID_DOMAIN",
            Self::AuthFailure(_) => "AUTH_FAILURE",
            Self::AlreadySubscribed => "ALREADY_SUBSCRIBED",
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDomain => write!(f, "{}: email domain is not allowed", self.signal()),
            Self::AuthFailure(failure) => write!(f, "{}: {failure}", self.signal()),
            Self::AlreadySubscribed => {
                write!(f, "{}: auth state already has a subscriber", self.signal())
            }
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AuthFailure(failure) => Some(failure),
            Self::InvalidDomain | Self::AlreadySubscribed => None,
        }
    }
}

/// Federated identity provider seam.
pub trait IdentityProvider {
    /// Short stable provider id used in logs.
    fn provider_id(&self) -> &str;
    /// Identity of the current provider session, if any.
    fn current_identity(&self) -> Option<Identity>;
    /// Runs the interactive sign-in flow.
    fn sign_in_interactive(&self) -> Result<Identity, ProviderFailure>;
    /// Tears down the provider session.
    fn sign_out(&self) -> Result<(), ProviderFailure>;
}
