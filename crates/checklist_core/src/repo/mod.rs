//! Persistence layer: local cache and remote document store.
//!
//! # Responsibility
//! - Define the store contracts the reconciliation controller depends on.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Local store failures are swallowed and logged; callers see "absent".
//! - Remote store failures are returned, never retried.

pub mod local_store;
pub mod remote_store;
