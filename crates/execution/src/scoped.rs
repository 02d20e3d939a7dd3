// Path: crates/execution/src/scoped.rs

//! Store and registry handles bound to an acting identity.

use tessera_api::frame::CallFrame;
use tessera_api::state::StateAccess;
use tessera_registry as registry;
use tessera_store::{self as store, TableDefinition};
use tessera_types::error::{CallError, RegistryError};
use tessera_types::schema::{DynamicValue, StaticValue};
use tessera_types::{Address, EncodedLengths, Record, ResourceId, Word};

/// The record store as seen by a running system.
///
/// When `checked`, every write first requires the identity to be authorized
/// on the table. Reads are never checked.
pub struct ScopedStore<'s, 'f> {
    frame: &'s mut CallFrame<'f>,
    identity: Address,
    checked: bool,
}

impl<'s, 'f> ScopedStore<'s, 'f> {
    pub(crate) fn new(frame: &'s mut CallFrame<'f>, identity: Address, checked: bool) -> Self {
        Self {
            frame,
            identity,
            checked,
        }
    }

    fn authorize(&self, table: &ResourceId) -> Result<(), CallError> {
        if self.checked && !registry::is_authorized(self.frame.state(), table, self.identity)? {
            tracing::debug!(target: "router", table = %table, identity = %self.identity, "store write denied");
            return Err(RegistryError::AccessDenied {
                resource: *table,
                caller: self.identity,
            }
            .into());
        }
        Ok(())
    }

    /// Read access to the frame's state.
    pub fn state(&self) -> &dyn StateAccess {
        self.frame.state()
    }

    /// See [`tessera_store::set_record`].
    pub fn set_record(
        &mut self,
        table: &ResourceId,
        key_tuple: &[Word],
        static_data: &[u8],
        encoded_lengths: EncodedLengths,
        dynamic_data: &[u8],
    ) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::set_record(
            self.frame,
            table,
            key_tuple,
            static_data,
            encoded_lengths,
            dynamic_data,
        )?)
    }

    /// See [`tessera_store::splice_static`].
    pub fn splice_static(
        &mut self,
        table: &ResourceId,
        key_tuple: &[Word],
        start: u64,
        data: &[u8],
    ) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::splice_static(self.frame, table, key_tuple, start, data)?)
    }

    /// See [`tessera_store::splice_dynamic`].
    pub fn splice_dynamic(
        &mut self,
        table: &ResourceId,
        key_tuple: &[Word],
        start: u64,
        delete_count: u64,
        encoded_lengths: EncodedLengths,
        data: &[u8],
    ) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::splice_dynamic(
            self.frame,
            table,
            key_tuple,
            start,
            delete_count,
            encoded_lengths,
            data,
        )?)
    }

    /// See [`tessera_store::delete_record`].
    pub fn delete_record(&mut self, table: &ResourceId, key_tuple: &[Word]) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::delete_record(self.frame, table, key_tuple)?)
    }

    /// See [`tessera_store::set_field`].
    pub fn set_field(
        &mut self,
        table: &ResourceId,
        key_tuple: &[Word],
        index: usize,
        data: &[u8],
    ) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::set_field(self.frame, table, key_tuple, index, data)?)
    }

    /// See [`tessera_store::set_static_field`].
    pub fn set_static_field(
        &mut self,
        table: &ResourceId,
        key_tuple: &[Word],
        index: usize,
        data: &[u8],
    ) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::set_static_field(self.frame, table, key_tuple, index, data)?)
    }

    /// See [`tessera_store::set_dynamic_field`].
    pub fn set_dynamic_field(
        &mut self,
        table: &ResourceId,
        key_tuple: &[Word],
        index: usize,
        data: &[u8],
    ) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::set_dynamic_field(self.frame, table, key_tuple, index, data)?)
    }

    /// See [`tessera_store::splice_dynamic_field`].
    pub fn splice_dynamic_field(
        &mut self,
        table: &ResourceId,
        key_tuple: &[Word],
        index: usize,
        start: u64,
        delete_count: u64,
        data: &[u8],
    ) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::splice_dynamic_field(
            self.frame,
            table,
            key_tuple,
            index,
            start,
            delete_count,
            data,
        )?)
    }

    /// See [`tessera_store::push_to_dynamic_field`].
    pub fn push_to_dynamic_field(
        &mut self,
        table: &ResourceId,
        key_tuple: &[Word],
        index: usize,
        data: &[u8],
    ) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::push_to_dynamic_field(self.frame, table, key_tuple, index, data)?)
    }

    /// See [`tessera_store::pop_from_dynamic_field`].
    pub fn pop_from_dynamic_field(
        &mut self,
        table: &ResourceId,
        key_tuple: &[Word],
        index: usize,
        count: u64,
    ) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::pop_from_dynamic_field(self.frame, table, key_tuple, index, count)?)
    }

    /// See [`tessera_store::set_values`].
    pub fn set_values(
        &mut self,
        table: &ResourceId,
        key_tuple: &[Word],
        static_values: &[StaticValue],
        dynamic_values: &[DynamicValue],
    ) -> Result<(), CallError> {
        self.authorize(table)?;
        Ok(store::set_values(
            self.frame,
            table,
            key_tuple,
            static_values,
            dynamic_values,
        )?)
    }

    /// See [`tessera_store::get_record`].
    pub fn get_record(&self, table: &ResourceId, key_tuple: &[Word]) -> Result<Option<Record>, CallError> {
        Ok(store::get_record(self.frame.state(), table, key_tuple)?)
    }

    /// See [`tessera_store::get_field`].
    pub fn get_field(&self, table: &ResourceId, key_tuple: &[Word], index: usize) -> Result<Vec<u8>, CallError> {
        Ok(store::get_field(self.frame.state(), table, key_tuple, index)?)
    }

    /// See [`tessera_store::get_values`].
    pub fn get_values(
        &self,
        table: &ResourceId,
        key_tuple: &[Word],
    ) -> Result<Option<(Vec<StaticValue>, Vec<DynamicValue>)>, CallError> {
        Ok(store::get_values(self.frame.state(), table, key_tuple)?)
    }
}

/// Registry mutations made by a running system, acting as a fixed identity.
pub struct RegistryHandle<'s, 'f> {
    frame: &'s mut CallFrame<'f>,
    identity: Address,
}

impl<'s, 'f> RegistryHandle<'s, 'f> {
    pub(crate) fn new(frame: &'s mut CallFrame<'f>, identity: Address) -> Self {
        Self { frame, identity }
    }

    /// The identity the handle acts as.
    pub fn identity(&self) -> Address {
        self.identity
    }

    /// Registers a namespace owned by the acting identity.
    pub fn register_namespace(&mut self, namespace: &ResourceId) -> Result<(), CallError> {
        Ok(registry::register_namespace(self.frame, namespace, self.identity)?)
    }

    /// Registers a table in a namespace the acting identity owns.
    pub fn register_table(&mut self, table: &ResourceId, definition: &TableDefinition) -> Result<(), CallError> {
        Ok(registry::register_table(self.frame, self.identity, table, definition)?)
    }

    /// Creates or upgrades a system in a namespace the acting identity owns.
    pub fn register_system(
        &mut self,
        system: &ResourceId,
        executable: Address,
        public_access: Option<bool>,
    ) -> Result<(), CallError> {
        Ok(registry::register_system(
            self.frame,
            self.identity,
            system,
            executable,
            public_access,
        )?)
    }

    /// Grants `identity` access to `resource`.
    pub fn grant_access(&mut self, resource: &ResourceId, identity: Address) -> Result<(), CallError> {
        Ok(registry::grant_access(self.frame, self.identity, resource, identity)?)
    }

    /// Revokes a grant on `resource`.
    pub fn revoke_access(&mut self, resource: &ResourceId, identity: Address) -> Result<(), CallError> {
        Ok(registry::revoke_access(self.frame, self.identity, resource, identity)?)
    }

    /// Hands a namespace to `new_owner`.
    pub fn transfer_ownership(&mut self, namespace: &ResourceId, new_owner: Address) -> Result<(), CallError> {
        Ok(registry::transfer_ownership(self.frame, self.identity, namespace, new_owner)?)
    }

    /// Burns a namespace's ownership.
    pub fn burn_ownership(&mut self, namespace: &ResourceId) -> Result<(), CallError> {
        Ok(registry::burn_ownership(self.frame, self.identity, namespace)?)
    }

    /// Moves value between namespaces, spending as the acting identity.
    pub fn transfer_balance(&mut self, from: &ResourceId, to: &ResourceId, amount: u128) -> Result<(), CallError> {
        Ok(registry::transfer_balance(self.frame, self.identity, from, to, amount)?)
    }
}
