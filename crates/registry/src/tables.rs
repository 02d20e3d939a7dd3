// Path: crates/registry/src/tables.rs

//! The built-in world tables.
//!
//! | table | key | value |
//! |---|---|---|
//! | `NamespaceOwner` | namespace id | owner address |
//! | `ResourceAccess` | resource id, identity | granted |
//! | `Systems` | system id | executable, public access |
//! | `SystemRegistry` | executable | system id |
//! | `Balances` | namespace id | balance |
//! | `Delegations` | delegator, delegatee | granted |

use crate::namespace::register_namespace;
use tessera_api::frame::CallFrame;
use tessera_api::state::StateAccess;
use tessera_store::{
    delete_record, get_values, register_store_tables, set_values, TableDefinition, STORE_NAMESPACE,
};
use tessera_types::error::{RegistryError, StoreError};
use tessera_types::schema::{StaticType, StaticValue};
use tessera_types::{Address, ResourceId, ResourceType, Schema, Word};

/// The namespace holding the registry's tables.
pub const WORLD_NAMESPACE: &str = "world";

/// `world:NamespaceOwner`.
pub const NAMESPACE_OWNER_TABLE: ResourceId =
    ResourceId::literal(ResourceType::Table, WORLD_NAMESPACE, "NamespaceOwner");
/// `world:ResourceAccess`.
pub const RESOURCE_ACCESS_TABLE: ResourceId =
    ResourceId::literal(ResourceType::Table, WORLD_NAMESPACE, "ResourceAccess");
/// `world:Systems`.
pub const SYSTEMS_TABLE: ResourceId = ResourceId::literal(ResourceType::Table, WORLD_NAMESPACE, "Systems");
/// `world:SystemRegistry`.
pub const SYSTEM_REGISTRY_TABLE: ResourceId =
    ResourceId::literal(ResourceType::Table, WORLD_NAMESPACE, "SystemRegistry");
/// `world:Balances`.
pub const BALANCES_TABLE: ResourceId = ResourceId::literal(ResourceType::Table, WORLD_NAMESPACE, "Balances");
/// `world:Delegations`.
pub const DELEGATIONS_TABLE: ResourceId =
    ResourceId::literal(ResourceType::Table, WORLD_NAMESPACE, "Delegations");

fn definition(keys: Vec<StaticType>, values: Vec<StaticType>) -> Result<TableDefinition, StoreError> {
    Ok(TableDefinition::new(Schema::static_only(keys)?, Schema::static_only(values)?))
}

/// The ids and definitions of every world table.
pub fn world_table_definitions() -> Result<Vec<(ResourceId, TableDefinition)>, StoreError> {
    use StaticType::{Address as Addr, Bool, FixedBytes, Uint};
    Ok(vec![
        (
            NAMESPACE_OWNER_TABLE,
            definition(vec![FixedBytes(32)], vec![Addr])?.with_names(&["namespaceId"], &["owner"]),
        ),
        (
            RESOURCE_ACCESS_TABLE,
            definition(vec![FixedBytes(32), Addr], vec![Bool])?
                .with_names(&["resourceId", "caller"], &["access"]),
        ),
        (
            SYSTEMS_TABLE,
            definition(vec![FixedBytes(32)], vec![Addr, Bool])?
                .with_names(&["systemId"], &["executable", "publicAccess"]),
        ),
        (
            SYSTEM_REGISTRY_TABLE,
            definition(vec![Addr], vec![FixedBytes(32)])?.with_names(&["executable"], &["systemId"]),
        ),
        (
            BALANCES_TABLE,
            definition(vec![FixedBytes(32)], vec![Uint(32)])?.with_names(&["namespaceId"], &["balance"]),
        ),
        (
            DELEGATIONS_TABLE,
            definition(vec![Addr, Addr], vec![Bool])?.with_names(&["delegator", "delegatee"], &["granted"]),
        ),
    ])
}

/// Creates the store and world tables and the root, `store` and `world`
/// namespaces, all owned by `creator`.
pub fn initialize_world(frame: &mut CallFrame<'_>, creator: Address) -> Result<(), RegistryError> {
    register_store_tables(frame)?;
    for (table, def) in world_table_definitions()? {
        tessera_store::register_table(frame, &table, &def)?;
    }
    register_namespace(frame, &ResourceId::root_namespace(), creator)?;
    register_namespace(frame, &ResourceId::namespace(STORE_NAMESPACE).map_err(StoreError::from)?, creator)?;
    register_namespace(frame, &ResourceId::namespace(WORLD_NAMESPACE).map_err(StoreError::from)?, creator)?;
    tracing::info!(target: "registry", creator = %creator, "initialized world");
    Ok(())
}

pub(crate) fn read_row(
    state: &dyn StateAccess,
    table: &ResourceId,
    key_tuple: &[Word],
) -> Result<Option<Vec<StaticValue>>, RegistryError> {
    Ok(get_values(state, table, key_tuple)?.map(|(statics, _)| statics))
}

pub(crate) fn write_row(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    values: &[StaticValue],
) -> Result<(), RegistryError> {
    Ok(set_values(frame, table, key_tuple, values, &[])?)
}

pub(crate) fn delete_row(frame: &mut CallFrame<'_>, table: &ResourceId, key_tuple: &[Word]) -> Result<(), RegistryError> {
    Ok(delete_record(frame, table, key_tuple)?)
}

pub(crate) fn malformed_row(table: &ResourceId) -> RegistryError {
    RegistryError::Store(StoreError::Decode(format!("unexpected row shape in {}", table)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_api::state::MemoryState;
    use tessera_store::{get_field_layout, resource_exists};

    #[test]
    fn test_initialize_world_registers_everything() {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        let creator = Address::repeat_byte(0xC0);
        initialize_world(&mut frame, creator).unwrap();

        for (table, def) in world_table_definitions().unwrap() {
            assert!(resource_exists(frame.state(), &table).unwrap());
            assert_eq!(get_field_layout(frame.state(), &table).unwrap(), def.field_layout().unwrap());
        }
        let world = ResourceId::namespace(WORLD_NAMESPACE).unwrap();
        assert_eq!(crate::get_owner(frame.state(), &world).unwrap(), Some(creator));
        assert_eq!(
            crate::get_owner(frame.state(), &ResourceId::root_namespace()).unwrap(),
            Some(creator)
        );
    }
}
