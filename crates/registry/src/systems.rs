// Path: crates/registry/src/systems.rs

//! System registration.
//!
//! `Systems` maps a stable system id to its current executable and
//! `SystemRegistry` maps the executable back to the id. Callers resolve
//! through `Systems` on every call, so an upgrade takes effect immediately.

use crate::namespace::{expect_type, require_owner};
use crate::tables::{
    delete_row, malformed_row, read_row, write_row, RESOURCE_ACCESS_TABLE, SYSTEMS_TABLE,
    SYSTEM_REGISTRY_TABLE,
};
use tessera_api::frame::CallFrame;
use tessera_api::state::StateAccess;
use tessera_store::set_resource_exists;
use tessera_types::error::RegistryError;
use tessera_types::schema::StaticValue;
use tessera_types::{Address, ResourceId, ResourceType, Word};

/// The registration of one system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemRecord {
    /// The identity whose code runs when the system is called.
    pub executable: Address,
    /// Whether any caller may invoke the system.
    pub public_access: bool,
}

/// Returns the registration of a system, if any.
pub fn get_system(state: &dyn StateAccess, system: &ResourceId) -> Result<Option<SystemRecord>, RegistryError> {
    match read_row(state, &SYSTEMS_TABLE, &[system.to_word()])? {
        None => Ok(None),
        Some(values) => match values.as_slice() {
            [StaticValue::Address(executable), StaticValue::Bool(public_access)] => Ok(Some(SystemRecord {
                executable: *executable,
                public_access: *public_access,
            })),
            _ => Err(malformed_row(&SYSTEMS_TABLE)),
        },
    }
}

/// Returns the system id an executable currently backs, if any.
pub fn system_for_executable(
    state: &dyn StateAccess,
    executable: Address,
) -> Result<Option<ResourceId>, RegistryError> {
    match read_row(state, &SYSTEM_REGISTRY_TABLE, &[executable.to_word()])? {
        None => Ok(None),
        Some(values) => match values.as_slice() {
            [StaticValue::FixedBytes(bytes)] => Word::try_from(bytes.as_slice())
                .map(|word| Some(ResourceId(word)))
                .map_err(|_| malformed_row(&SYSTEM_REGISTRY_TABLE)),
            _ => Err(malformed_row(&SYSTEM_REGISTRY_TABLE)),
        },
    }
}

/// Creates or upgrades a system.
///
/// The first registration creates the system with `public_access` defaulting
/// to false. Later registrations upgrade it: the executable is swapped, the
/// old executable loses its reverse index entry and its access to the
/// namespace, and `public_access` changes only when supplied. Grants made
/// directly to the old executable on other resources stay in place.
pub fn register_system(
    frame: &mut CallFrame<'_>,
    caller: Address,
    system: &ResourceId,
    executable: Address,
    public_access: Option<bool>,
) -> Result<(), RegistryError> {
    expect_type(system, ResourceType::System)?;
    if executable.is_zero() {
        return Err(RegistryError::InvalidExecutable(executable));
    }
    let namespace = system.namespace_id();
    require_owner(frame.state(), &namespace, caller)?;
    if let Some(existing) = system_for_executable(frame.state(), executable)? {
        if existing != *system {
            return Err(RegistryError::ExecutableInUse {
                executable,
                system: existing,
            });
        }
    }

    let previous = get_system(frame.state(), system)?;
    let public_access = public_access
        .or(previous.map(|p| p.public_access))
        .unwrap_or(false);
    match previous {
        Some(prev) if prev.executable != executable => {
            delete_row(frame, &SYSTEM_REGISTRY_TABLE, &[prev.executable.to_word()])?;
            delete_row(
                frame,
                &RESOURCE_ACCESS_TABLE,
                &[namespace.to_word(), prev.executable.to_word()],
            )?;
        }
        Some(_) => {}
        None => set_resource_exists(frame, system)?,
    }

    write_row(
        frame,
        &SYSTEMS_TABLE,
        &[system.to_word()],
        &[StaticValue::Address(executable), StaticValue::Bool(public_access)],
    )?;
    write_row(
        frame,
        &SYSTEM_REGISTRY_TABLE,
        &[executable.to_word()],
        &[StaticValue::FixedBytes(system.0.to_vec())],
    )?;
    write_row(
        frame,
        &RESOURCE_ACCESS_TABLE,
        &[namespace.to_word(), executable.to_word()],
        &[StaticValue::Bool(true)],
    )?;

    tracing::info!(
        target: "registry",
        system = %system,
        executable = %executable,
        public_access,
        upgrade = previous.is_some(),
        "registered system"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{has_direct_access, is_authorized, register_namespace};
    use crate::tables::initialize_world;
    use tessera_api::state::MemoryState;

    const ADMIN: Address = Address::repeat_byte(0xAD);
    const OWNER: Address = Address::repeat_byte(0x01);
    const C1: Address = Address::repeat_byte(0xC1);
    const C2: Address = Address::repeat_byte(0xC2);

    fn counter() -> ResourceId {
        ResourceId::new(ResourceType::System, "app", "Counter").unwrap()
    }

    fn setup(frame: &mut CallFrame<'_>) {
        initialize_world(frame, ADMIN).unwrap();
        register_namespace(frame, &ResourceId::namespace("app").unwrap(), OWNER).unwrap();
    }

    #[test]
    fn test_create_then_upgrade() {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        setup(&mut frame);
        let app = counter().namespace_id();

        register_system(&mut frame, OWNER, &counter(), C1, None).unwrap();
        assert_eq!(
            get_system(frame.state(), &counter()).unwrap(),
            Some(SystemRecord {
                executable: C1,
                public_access: false
            })
        );
        assert_eq!(system_for_executable(frame.state(), C1).unwrap(), Some(counter()));
        assert!(has_direct_access(frame.state(), &app, C1).unwrap());

        register_system(&mut frame, OWNER, &counter(), C1, Some(true)).unwrap();
        register_system(&mut frame, OWNER, &counter(), C2, None).unwrap();
        let record = get_system(frame.state(), &counter()).unwrap().unwrap();
        assert_eq!(record.executable, C2);
        assert!(record.public_access);
        assert_eq!(system_for_executable(frame.state(), C1).unwrap(), None);
        assert_eq!(system_for_executable(frame.state(), C2).unwrap(), Some(counter()));
        assert!(!has_direct_access(frame.state(), &app, C1).unwrap());
        assert!(is_authorized(frame.state(), &app, C2).unwrap());
    }

    #[test]
    fn test_register_system_validations() {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        setup(&mut frame);

        let table = ResourceId::new(ResourceType::Table, "app", "Counter").unwrap();
        assert!(matches!(
            register_system(&mut frame, OWNER, &table, C1, None),
            Err(RegistryError::InvalidResourceType { .. })
        ));
        assert!(matches!(
            register_system(&mut frame, OWNER, &counter(), Address::ZERO, None),
            Err(RegistryError::InvalidExecutable(_))
        ));
        assert!(matches!(
            register_system(&mut frame, C1, &counter(), C1, None),
            Err(RegistryError::NotOwner { .. })
        ));
        let orphan = ResourceId::new(ResourceType::System, "ghost", "S").unwrap();
        assert!(matches!(
            register_system(&mut frame, OWNER, &orphan, C1, None),
            Err(RegistryError::NotRegistered(_))
        ));

        register_system(&mut frame, OWNER, &counter(), C1, None).unwrap();
        let other = ResourceId::new(ResourceType::System, "app", "Other").unwrap();
        assert!(matches!(
            register_system(&mut frame, OWNER, &other, C1, None),
            Err(RegistryError::ExecutableInUse { .. })
        ));
    }

    #[test]
    fn test_public_system_is_authorized_for_anyone() {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        setup(&mut frame);
        let stranger = Address::repeat_byte(0x77);

        register_system(&mut frame, OWNER, &counter(), C1, None).unwrap();
        assert!(!is_authorized(frame.state(), &counter(), stranger).unwrap());
        register_system(&mut frame, OWNER, &counter(), C1, Some(true)).unwrap();
        assert!(is_authorized(frame.state(), &counter(), stranger).unwrap());
    }
}
