//! Runtime configuration for auth gating and sync behavior.
//!
//! Defaults match the deployed application; `from_env` overlays
//! `CHECKLIST_*` environment variables.

use log::warn;
use std::str::FromStr;

/// Quiet period before an active-checklist edit is written remotely.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1_500;
/// Email domain allowed to sign in.
pub const DEFAULT_ALLOWED_DOMAIN: &str = "q4inc.com";

const ENV_ALLOWED_DOMAIN: &str = "CHECKLIST_ALLOWED_DOMAIN";
const ENV_DEBOUNCE_MS: &str = "CHECKLIST_DEBOUNCE_MS";
const ENV_CLEAR_LOCAL_ON_SIGN_OUT: &str = "CHECKLIST_CLEAR_LOCAL_ON_SIGN_OUT";
const ENV_DELETE_REMOTE_ON_LOCAL_DELETE: &str = "CHECKLIST_DELETE_REMOTE_ON_LOCAL_DELETE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Domain suffix (without `@`) required on sign-in emails.
    pub allowed_domain: String,
    pub debounce_ms: u64,
    /// Remove cached lists from the local store on explicit sign-out.
    pub clear_local_on_sign_out: bool,
    /// Issue a remote delete when a checklist is deleted locally.
    pub delete_remote_on_local_delete: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            allowed_domain: DEFAULT_ALLOWED_DOMAIN.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            clear_local_on_sign_out: true,
            delete_remote_on_local_delete: false,
        }
    }
}

impl SyncConfig {
    /// Builds config from defaults overlaid with process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds config from defaults overlaid with `lookup` values.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(domain) = lookup(ENV_ALLOWED_DOMAIN) {
            let domain = domain.trim().trim_start_matches('@');
            if domain.is_empty() {
                warn!("event=config_load module=config status=error key={ENV_ALLOWED_DOMAIN} reason=blank");
            } else {
                config.allowed_domain = domain.to_ascii_lowercase();
            }
        }
        if let Some(value) = parse_var(&lookup, ENV_DEBOUNCE_MS) {
            config.debounce_ms = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_CLEAR_LOCAL_ON_SIGN_OUT) {
            config.clear_local_on_sign_out = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_DELETE_REMOTE_ON_LOCAL_DELETE) {
            config.delete_remote_on_local_delete = value;
        }

        config
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().to_ascii_lowercase().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("event=config_load module=config status=error key={key} reason=unparsable");
            None
        }
    }
}
