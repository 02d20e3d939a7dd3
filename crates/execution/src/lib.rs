// Path: crates/execution/src/lib.rs
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
//! # Tessera Execution
//!
//! The call router and everything a system sees while it runs.
//!
//! A call names a system id. The router resolves it through the registry on
//! every call, checks the caller, opens a child frame and hands the system a
//! [`CallContext`]. Systems outside the root namespace run in standard mode:
//! they see a substituted caller and a store handle scoped to what their
//! executable is authorized for. Root systems run context-preserving with
//! unscoped store and registry access, and are reachable only through
//! [`Router::call`] and [`Router::call_root`].
//!
//! [`World`] wraps a state backend and an event log and runs each entry point
//! as one all-or-nothing transaction.

/// The per-call context handed to systems.
pub mod context;
/// The executable directory and the `System` trait.
pub mod directory;
/// Dispatch and the router entry points.
pub mod router;
/// Permission-scoped store and registry handles.
pub mod scoped;
/// The world facade: top-level transactions and event log appends.
pub mod world;

pub use context::{CallContext, CallMode};
pub use directory::{ExecutableDirectory, System};
pub use router::{Router, SystemCall};
pub use scoped::{RegistryHandle, ScopedStore};
pub use world::World;
