// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Tessera Types
//!
//! This crate is the foundational library for Tessera, containing the resource
//! identifiers, the record encoding, the store event wire format, error types
//! and configuration objects.
//!
//! ## Architectural Role
//!
//! As the base crate, `tessera-types` has minimal dependencies and is itself a
//! dependency for every other crate in the workspace. The byte-level record
//! logic (`Record::splice_static`, `Record::splice_dynamic`) lives here so the
//! authoritative store and every replica compute identical bytes from the same
//! inputs.

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::StoreError> = std::result::Result<T, E>;

/// The canonical, deterministic binary codec for persisted values and events.
pub mod codec;
/// Shared configuration structures (`WorldConfig`, `ReplicatorConfig`).
pub mod config;
/// A unified set of all error types used across the workspace.
pub mod error;
/// The store event wire format.
pub mod events;
/// Constants and helpers for the key/value layout of persisted state.
pub mod keys;
/// The packed dynamic-field length header.
pub mod lengths;
/// The record value and its splice rules.
pub mod record;
/// Resource identifiers and identities.
pub mod resource;
/// Field layouts, schemas and typed value encoding.
pub mod schema;

pub use events::{EventId, LoggedEvent, StoreEvent};
pub use lengths::EncodedLengths;
pub use record::{Record, RecordKey};
pub use resource::{Address, ResourceId, ResourceType, Word};
pub use schema::{FieldLayout, Schema};
