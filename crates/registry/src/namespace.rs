// Path: crates/registry/src/namespace.rs

//! Namespace ownership, access grants and the authorization check.
//!
//! A namespace is the only resource with an owner. Access granted on a
//! namespace covers every resource inside it; access granted on a single
//! resource covers only that resource. The two levels are consulted in turn
//! and never merged.

use crate::systems::get_system;
use crate::tables::{
    delete_row, malformed_row, read_row, write_row, NAMESPACE_OWNER_TABLE, RESOURCE_ACCESS_TABLE,
};
use tessera_api::frame::CallFrame;
use tessera_api::state::StateAccess;
use tessera_store::{resource_exists, set_resource_exists, TableDefinition};
use tessera_types::error::RegistryError;
use tessera_types::schema::StaticValue;
use tessera_types::{Address, ResourceId, ResourceType};

pub(crate) fn expect_type(id: &ResourceId, expected: ResourceType) -> Result<(), RegistryError> {
    match id.resource_type() {
        Ok(ty) if ty == expected => Ok(()),
        _ => Err(RegistryError::InvalidResourceType {
            resource: *id,
            expected,
        }),
    }
}

/// Fails unless `caller` is the live owner of `namespace`.
pub(crate) fn require_owner(
    state: &dyn StateAccess,
    namespace: &ResourceId,
    caller: Address,
) -> Result<(), RegistryError> {
    match get_owner(state, namespace)? {
        None => Err(RegistryError::NotRegistered(*namespace)),
        Some(owner) if owner.is_zero() => Err(RegistryError::NamespaceBurned(*namespace)),
        Some(owner) if owner == caller => Ok(()),
        Some(_) => Err(RegistryError::NotOwner {
            resource: *namespace,
            caller,
        }),
    }
}

/// Returns the owner of a namespace, `Address::ZERO` once burned, or `None`
/// if the namespace was never registered.
pub fn get_owner(state: &dyn StateAccess, namespace: &ResourceId) -> Result<Option<Address>, RegistryError> {
    match read_row(state, &NAMESPACE_OWNER_TABLE, &[namespace.to_word()])? {
        None => Ok(None),
        Some(values) => match values.as_slice() {
            [StaticValue::Address(owner)] => Ok(Some(*owner)),
            _ => Err(malformed_row(&NAMESPACE_OWNER_TABLE)),
        },
    }
}

/// Creates a namespace owned by `owner` with an empty access set.
pub fn register_namespace(
    frame: &mut CallFrame<'_>,
    namespace: &ResourceId,
    owner: Address,
) -> Result<(), RegistryError> {
    expect_type(namespace, ResourceType::Namespace)?;
    if namespace.name_bytes().iter().any(|b| *b != 0) {
        return Err(RegistryError::InvalidResourceType {
            resource: *namespace,
            expected: ResourceType::Namespace,
        });
    }
    if resource_exists(frame.state(), namespace)? {
        return Err(RegistryError::DuplicateRegistration(*namespace));
    }
    set_resource_exists(frame, namespace)?;
    write_row(
        frame,
        &NAMESPACE_OWNER_TABLE,
        &[namespace.to_word()],
        &[StaticValue::Address(owner)],
    )?;
    tracing::info!(target: "registry", namespace = %namespace, owner = %owner, "registered namespace");
    Ok(())
}

/// Hands a namespace to `new_owner`. The previous owner loses any access row
/// it held on the namespace; the new owner gains only the owner role.
/// Transferring to `Address::ZERO` burns the namespace.
pub fn transfer_ownership(
    frame: &mut CallFrame<'_>,
    caller: Address,
    namespace: &ResourceId,
    new_owner: Address,
) -> Result<(), RegistryError> {
    require_owner(frame.state(), namespace, caller)?;
    write_row(
        frame,
        &NAMESPACE_OWNER_TABLE,
        &[namespace.to_word()],
        &[StaticValue::Address(new_owner)],
    )?;
    if new_owner != caller && has_direct_access(frame.state(), namespace, caller)? {
        delete_row(frame, &RESOURCE_ACCESS_TABLE, &[namespace.to_word(), caller.to_word()])?;
    }
    if new_owner.is_zero() {
        tracing::info!(target: "registry", namespace = %namespace, "burned namespace ownership");
    } else {
        tracing::info!(
            target: "registry",
            namespace = %namespace,
            from = %caller,
            to = %new_owner,
            "transferred namespace ownership"
        );
    }
    Ok(())
}

/// Sets the owner of a namespace to the null identity. Terminal.
pub fn burn_ownership(
    frame: &mut CallFrame<'_>,
    caller: Address,
    namespace: &ResourceId,
) -> Result<(), RegistryError> {
    transfer_ownership(frame, caller, namespace, Address::ZERO)
}

/// Returns true if `identity` holds an access row on exactly `resource`.
pub fn has_direct_access(
    state: &dyn StateAccess,
    resource: &ResourceId,
    identity: Address,
) -> Result<bool, RegistryError> {
    match read_row(state, &RESOURCE_ACCESS_TABLE, &[resource.to_word(), identity.to_word()])? {
        None => Ok(false),
        Some(values) => match values.as_slice() {
            [StaticValue::Bool(granted)] => Ok(*granted),
            _ => Err(malformed_row(&RESOURCE_ACCESS_TABLE)),
        },
    }
}

fn check_grantable(
    state: &dyn StateAccess,
    caller: Address,
    resource: &ResourceId,
) -> Result<(), RegistryError> {
    if !resource_exists(state, resource)? {
        return Err(RegistryError::NotRegistered(*resource));
    }
    require_owner(state, &resource.namespace_id(), caller)
}

/// Grants `identity` access to `resource`. Only the owner of the containing
/// namespace may grant.
pub fn grant_access(
    frame: &mut CallFrame<'_>,
    caller: Address,
    resource: &ResourceId,
    identity: Address,
) -> Result<(), RegistryError> {
    check_grantable(frame.state(), caller, resource)?;
    write_row(
        frame,
        &RESOURCE_ACCESS_TABLE,
        &[resource.to_word(), identity.to_word()],
        &[StaticValue::Bool(true)],
    )?;
    tracing::info!(target: "registry", resource = %resource, identity = %identity, "granted access");
    Ok(())
}

/// Removes a grant made with [`grant_access`]. Revoking a grant that does not
/// exist succeeds.
pub fn revoke_access(
    frame: &mut CallFrame<'_>,
    caller: Address,
    resource: &ResourceId,
    identity: Address,
) -> Result<(), RegistryError> {
    check_grantable(frame.state(), caller, resource)?;
    delete_row(frame, &RESOURCE_ACCESS_TABLE, &[resource.to_word(), identity.to_word()])?;
    tracing::info!(target: "registry", resource = %resource, identity = %identity, "revoked access");
    Ok(())
}

/// Decides whether `caller` may act on `resource`.
///
/// True if the resource is a public system, if the caller owns the
/// containing namespace, or if the caller holds a grant on the namespace or
/// on the resource itself.
pub fn is_authorized(
    state: &dyn StateAccess,
    resource: &ResourceId,
    caller: Address,
) -> Result<bool, RegistryError> {
    if resource.resource_type() == Ok(ResourceType::System) {
        if let Some(system) = get_system(state, resource)? {
            if system.public_access {
                return Ok(true);
            }
        }
    }
    let namespace = resource.namespace_id();
    if !caller.is_zero() && get_owner(state, &namespace)? == Some(caller) {
        return Ok(true);
    }
    if has_direct_access(state, &namespace, caller)? {
        return Ok(true);
    }
    if *resource != namespace && has_direct_access(state, resource, caller)? {
        return Ok(true);
    }
    Ok(false)
}

/// Registers a table in a namespace owned by `caller`.
pub fn register_table(
    frame: &mut CallFrame<'_>,
    caller: Address,
    table: &ResourceId,
    definition: &TableDefinition,
) -> Result<(), RegistryError> {
    if !table.resource_type().is_ok_and(ResourceType::is_table) {
        return Err(RegistryError::InvalidResourceType {
            resource: *table,
            expected: ResourceType::Table,
        });
    }
    require_owner(frame.state(), &table.namespace_id(), caller)?;
    if resource_exists(frame.state(), table)? {
        return Err(RegistryError::DuplicateRegistration(*table));
    }
    tessera_store::register_table(frame, table, definition)?;
    Ok(())
}
