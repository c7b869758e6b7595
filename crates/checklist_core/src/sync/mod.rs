//! Local/remote reconciliation.
//!
//! # Responsibility
//! - Hydrate in-memory state from the remote store on identity change.
//! - Mirror every mutation to the local store synchronously.
//! - Write the active checklist remotely after a quiet period, and the whole
//!   collection immediately on structural changes.
//!
//! # Invariants
//! - Local state is the immediate source of truth; remote failures never roll
//!   back an applied mutation.
//! - At most one debounced remote write is pending at a time.

pub mod clock;
pub mod controller;
pub mod debounce;
