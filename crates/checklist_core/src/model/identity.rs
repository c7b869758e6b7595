//! Authenticated principal.

use serde::{Deserialize, Serialize};

/// Opaque user reference plus the email used for the domain allowlist.
///
/// `user_ref` partitions remote data; `email` is only inspected at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_ref: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_ref: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_ref: user_ref.into(),
            email: Some(email.into()),
        }
    }

    /// Returns whether the email ends with `@{domain}`, ignoring ASCII case.
    ///
    /// Identities without an email never match.
    pub fn has_email_domain(&self, domain: &str) -> bool {
        let Some(email) = self.email.as_deref() else {
            return false;
        };
        let domain = domain.trim().trim_start_matches('@');
        if domain.is_empty() {
            return false;
        }
        let suffix = format!("@{}", domain.to_ascii_lowercase());
        email.trim().to_ascii_lowercase().ends_with(&suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::Identity;

    #[test]
    fn domain_match_requires_at_sign_boundary() {
        let identity = Identity::new("u1", "ana@q4inc.com");
        assert!(identity.has_email_domain("q4inc.com"));
        assert!(identity.has_email_domain("@Q4INC.com"));

        let lookalike = Identity::new("u2", "ana@evilq4inc.com");
        assert!(!lookalike.has_email_domain("q4inc.com"));
    }

    #[test]
    fn missing_email_or_blank_domain_never_matches() {
        let anonymous = Identity {
            user_ref: "u3".to_string(),
            email: None,
        };
        assert!(!anonymous.has_email_domain("q4inc.com"));
        assert!(!Identity::new("u4", "ana@q4inc.com").has_email_domain("  "));
    }
}
