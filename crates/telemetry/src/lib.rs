// Path: crates/telemetry/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Tessera Telemetry
//!
//! Structured logging initialization. Library crates only emit `tracing`
//! events and `log` records; binaries and tests pick a subscriber here.

/// The initialization routines for global structured logging.
pub mod init;

pub use init::{init_test_tracing, init_tracing};
