// Path: crates/replicator/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Tessera Replicator
//!
//! Rebuilds record state from the store event log alone.
//!
//! [`reduce`] is the pure per-record step. A [`Replica`] folds logged events
//! through it, learning table layouts from the `store:Tables` records in the
//! stream, and tracks per-key cursors so replaying an event twice is a no-op.
//! The [`Replicator`] drives a replica from an `EventLog`, either one batch
//! at a time or continuously on a tokio runtime.

/// The pure record reducer.
pub mod reducer;
/// The event-sourced record mirror.
pub mod replica;
/// The log consumer loop.
pub mod replicator;

pub use reducer::reduce;
pub use replica::Replica;
pub use replicator::{Replicator, ReplicatorStats};
