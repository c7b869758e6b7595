//! Core logic for the checklist app with per-user cloud sync.
//! This crate is the single source of truth for checklist invariants and the
//! local/remote reconciliation flow.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod state;
pub mod sync;
pub mod transfer;

pub use app::ChecklistApp;
pub use auth::{
    AuthError, AuthGateway, AuthResult, AuthStateEvent, AuthSubscription, IdentityProvider,
    ProviderFailure, StaticIdentityProvider,
};
pub use config::SyncConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::checklist::{Checklist, ChecklistCollection};
pub use model::identity::Identity;
pub use model::task::{Task, TaskFilter};
pub use model::ChecklistError;
pub use repo::local_store::{LocalStore, SqliteLocalStore};
pub use repo::remote_store::{
    ChecklistPatch, RemoteChecklistDocument, RemoteError, RemoteResult, RemoteStore,
    SqliteRemoteStore,
};
pub use state::{Action, AppState, AuthPhase, Effect, SessionState};
pub use sync::clock::{Clock, ManualClock, SystemClock};
pub use sync::controller::{
    ControllerError, ControllerResult, HydrationOutcome, PendingWrite, ReconciliationController,
};
pub use transfer::{
    export_checklist, export_collection, export_file_name, parse_import, ExportFile,
    ImportPayload, TransferError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
