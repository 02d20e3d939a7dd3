// Path: crates/api/src/lib.rs

//! # Tessera API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
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
//! # Tessera API
//!
//! Core traits and interfaces shared by the store, the router and the
//! replicator: key/value state access, transactional call frames and the
//! event log.

/// The append-only store event log.
pub mod event_log;
/// Transaction frames: a state overlay plus the events it buffered.
pub mod frame;
/// Key/value state access, the in-memory backend and the copy-on-write overlay.
pub mod state;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::event_log::{EventLog, MemoryEventLog};
    pub use crate::frame::CallFrame;
    pub use crate::state::{MemoryState, StateAccess, StateOverlay};
}
