// Path: crates/execution/src/world.rs

//! The world facade.
//!
//! Each public mutator runs as one top-level transaction: a fresh frame over
//! the backend, the operation, then either a commit (writes applied to the
//! backend, then events appended to the log) or nothing at all. A commit whose
//! apply or append fails puts the touched keys back, so the log never holds
//! events the backend does not reflect.

use crate::directory::{ExecutableDirectory, System};
use crate::router::{Router, SystemCall};
use std::sync::Arc;
use tessera_api::event_log::EventLog;
use tessera_api::frame::CallFrame;
use tessera_api::state::StateAccess;
use tessera_registry as registry;
use tessera_store::TableDefinition;
use tessera_types::config::WorldConfig;
use tessera_types::error::{CallError, ErrorCode};
use tessera_types::{Address, ResourceId};

/// A state backend, a router and an event log.
pub struct World {
    state: Box<dyn StateAccess>,
    router: Router,
    log: Arc<dyn EventLog>,
}

impl World {
    /// Wraps an already initialized backend.
    pub fn new(
        state: Box<dyn StateAccess>,
        directory: ExecutableDirectory,
        log: Arc<dyn EventLog>,
        config: WorldConfig,
    ) -> Self {
        Self {
            state,
            router: Router::new(directory, config),
            log,
        }
    }

    /// Creates a world over an empty backend and initializes the built-in
    /// tables and namespaces, owned by `creator`.
    pub fn genesis(
        state: Box<dyn StateAccess>,
        directory: ExecutableDirectory,
        log: Arc<dyn EventLog>,
        config: WorldConfig,
        creator: Address,
    ) -> Result<Self, CallError> {
        let mut world = Self::new(state, directory, log, config);
        world.transact("genesis", |_, frame| Ok(registry::initialize_world(frame, creator)?))?;
        Ok(world)
    }

    /// Read access to committed state.
    pub fn state(&self) -> &dyn StateAccess {
        self.state.as_ref()
    }

    /// The event log committed calls are appended to.
    pub fn log(&self) -> Arc<dyn EventLog> {
        self.log.clone()
    }

    /// The router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Deploys code under an executable identity.
    pub fn deploy(&mut self, executable: Address, system: Arc<dyn System>) {
        self.router.directory_mut().deploy(executable, system);
    }

    fn transact<T, F>(&mut self, op: &'static str, f: F) -> Result<T, CallError>
    where
        F: FnOnce(&Router, &mut CallFrame<'_>) -> Result<T, CallError>,
    {
        let (value, output) = {
            let mut frame = CallFrame::new(self.state.as_ref());
            match f(&self.router, &mut frame) {
                Ok(value) => (value, frame.finish()),
                Err(e) => {
                    tracing::warn!(target: "world", op, code = e.code(), error = %e, "transaction rolled back");
                    return Err(e);
                }
            }
        };
        let (inserts, deletes) = output.changes;
        let touched: Vec<Vec<u8>> = inserts
            .iter()
            .map(|(key, _)| key.clone())
            .chain(deletes.iter().cloned())
            .collect();
        let previous = self.state.batch_get(&touched)?;
        if let Err(e) = self.state.batch_apply(&inserts, &deletes) {
            tracing::error!(target: "world", op, error = %e, "state apply failed");
            self.restore(touched, previous)?;
            return Err(e.into());
        }
        let first = match self.log.append_batch(&output.events) {
            Ok(first) => first,
            Err(e) => {
                tracing::error!(target: "world", op, error = %e, "event append failed");
                self.restore(touched, previous)?;
                return Err(e.into());
            }
        };
        tracing::info!(
            target: "world",
            op,
            events = output.events.len(),
            first_event = ?first.map(|id| id.0),
            "transaction committed"
        );
        Ok(value)
    }

    /// Puts `keys` back to the values they held before a failed commit.
    fn restore(&mut self, keys: Vec<Vec<u8>>, previous: Vec<Option<Vec<u8>>>) -> Result<(), CallError> {
        let mut inserts = Vec::new();
        let mut deletes = Vec::new();
        for (key, value) in keys.into_iter().zip(previous) {
            match value {
                Some(value) => inserts.push((key, value)),
                None => deletes.push(key),
            }
        }
        self.state.batch_apply(&inserts, &deletes)?;
        Ok(())
    }

    /// Calls a system through the generic entry point.
    pub fn call(
        &mut self,
        caller: Address,
        target: &ResourceId,
        input: &[u8],
        value: u128,
    ) -> Result<Vec<u8>, CallError> {
        self.transact("call", |router, frame| router.call(frame, caller, target, input, value))
    }

    /// Calls a root system through the narrow root entry point.
    pub fn call_root(
        &mut self,
        caller: Address,
        target: &ResourceId,
        input: &[u8],
        value: u128,
    ) -> Result<Vec<u8>, CallError> {
        self.transact("call_root", |router, frame| {
            router.call_root(frame, caller, target, input, value)
        })
    }

    /// Runs a batch atomically.
    pub fn batch_call(&mut self, caller: Address, calls: &[SystemCall]) -> Result<Vec<Vec<u8>>, CallError> {
        self.transact("batch_call", |router, frame| router.batch_call(frame, caller, calls))
    }

    /// Calls on behalf of a delegator.
    pub fn call_from(
        &mut self,
        delegator: Address,
        caller: Address,
        target: &ResourceId,
        input: &[u8],
        value: u128,
    ) -> Result<Vec<u8>, CallError> {
        self.transact("call_from", |router, frame| {
            router.call_from(frame, delegator, caller, target, input, value)
        })
    }

    /// Registers a namespace owned by `caller`.
    pub fn register_namespace(&mut self, caller: Address, namespace: &ResourceId) -> Result<(), CallError> {
        self.transact("register_namespace", |_, frame| {
            Ok(registry::register_namespace(frame, namespace, caller)?)
        })
    }

    /// Registers a table in a namespace `caller` owns.
    pub fn register_table(
        &mut self,
        caller: Address,
        table: &ResourceId,
        definition: &TableDefinition,
    ) -> Result<(), CallError> {
        self.transact("register_table", |_, frame| {
            Ok(registry::register_table(frame, caller, table, definition)?)
        })
    }

    /// Creates or upgrades a system.
    pub fn register_system(
        &mut self,
        caller: Address,
        system: &ResourceId,
        executable: Address,
        public_access: Option<bool>,
    ) -> Result<(), CallError> {
        self.transact("register_system", |_, frame| {
            Ok(registry::register_system(frame, caller, system, executable, public_access)?)
        })
    }

    /// Grants `identity` access to `resource`.
    pub fn grant_access(&mut self, caller: Address, resource: &ResourceId, identity: Address) -> Result<(), CallError> {
        self.transact("grant_access", |_, frame| {
            Ok(registry::grant_access(frame, caller, resource, identity)?)
        })
    }

    /// Revokes a grant on `resource`.
    pub fn revoke_access(&mut self, caller: Address, resource: &ResourceId, identity: Address) -> Result<(), CallError> {
        self.transact("revoke_access", |_, frame| {
            Ok(registry::revoke_access(frame, caller, resource, identity)?)
        })
    }

    /// Hands a namespace to `new_owner`.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        namespace: &ResourceId,
        new_owner: Address,
    ) -> Result<(), CallError> {
        self.transact("transfer_ownership", |_, frame| {
            Ok(registry::transfer_ownership(frame, caller, namespace, new_owner)?)
        })
    }

    /// Burns a namespace's ownership.
    pub fn burn_ownership(&mut self, caller: Address, namespace: &ResourceId) -> Result<(), CallError> {
        self.transact("burn_ownership", |_, frame| {
            Ok(registry::burn_ownership(frame, caller, namespace)?)
        })
    }

    /// Lets `delegatee` call on behalf of `delegator`.
    pub fn register_delegation(&mut self, delegator: Address, delegatee: Address) -> Result<(), CallError> {
        self.transact("register_delegation", |_, frame| {
            Ok(registry::register_delegation(frame, delegator, delegatee)?)
        })
    }

    /// Removes a delegation.
    pub fn unregister_delegation(&mut self, delegator: Address, delegatee: Address) -> Result<(), CallError> {
        self.transact("unregister_delegation", |_, frame| {
            Ok(registry::unregister_delegation(frame, delegator, delegatee)?)
        })
    }
}
