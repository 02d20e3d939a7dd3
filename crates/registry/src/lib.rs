// Path: crates/registry/src/lib.rs
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
//! # Tessera Registry
//!
//! The access-controlled resource registry. Namespace ownership, access
//! grants, system registrations, namespace balances and delegations all live
//! in built-in tables of the `world` namespace and are written through the
//! record store, so every registry change is transactional and shows up in
//! the event stream like any other record mutation.
//!
//! Mutators take the acting identity explicitly. Reads are unauthenticated.

/// Value held by namespaces.
pub mod balances;
/// Unlimited call delegations.
pub mod delegation;
/// Ownership and access checks.
pub mod namespace;
/// System registration and upgrade.
pub mod systems;
/// The built-in world tables and world initialization.
pub mod tables;

pub use balances::{balance_of, credit_balance, transfer_balance};
pub use delegation::{has_delegation, register_delegation, unregister_delegation};
pub use namespace::{
    burn_ownership, get_owner, grant_access, has_direct_access, is_authorized, register_namespace,
    register_table, revoke_access, transfer_ownership,
};
pub use systems::{get_system, register_system, system_for_executable, SystemRecord};
pub use tables::{
    initialize_world, world_table_definitions, BALANCES_TABLE, DELEGATIONS_TABLE, NAMESPACE_OWNER_TABLE,
    RESOURCE_ACCESS_TABLE, SYSTEMS_TABLE, SYSTEM_REGISTRY_TABLE, WORLD_NAMESPACE,
};
