// Path: crates/registry/src/delegation.rs

//! Unlimited delegations. A delegatee may make calls on behalf of any
//! delegator that registered it.

use crate::tables::{delete_row, malformed_row, read_row, write_row, DELEGATIONS_TABLE};
use tessera_api::frame::CallFrame;
use tessera_api::state::StateAccess;
use tessera_types::error::RegistryError;
use tessera_types::schema::StaticValue;
use tessera_types::Address;

/// Returns true if `delegatee` may act for `delegator`.
pub fn has_delegation(
    state: &dyn StateAccess,
    delegator: Address,
    delegatee: Address,
) -> Result<bool, RegistryError> {
    match read_row(state, &DELEGATIONS_TABLE, &[delegator.to_word(), delegatee.to_word()])? {
        None => Ok(false),
        Some(values) => match values.as_slice() {
            [StaticValue::Bool(granted)] => Ok(*granted),
            _ => Err(malformed_row(&DELEGATIONS_TABLE)),
        },
    }
}

/// Lets `delegatee` act on behalf of `delegator`. The delegator is the
/// acting identity.
pub fn register_delegation(
    frame: &mut CallFrame<'_>,
    delegator: Address,
    delegatee: Address,
) -> Result<(), RegistryError> {
    write_row(
        frame,
        &DELEGATIONS_TABLE,
        &[delegator.to_word(), delegatee.to_word()],
        &[StaticValue::Bool(true)],
    )?;
    tracing::info!(target: "registry", delegator = %delegator, delegatee = %delegatee, "registered delegation");
    Ok(())
}

/// Removes a delegation. Fails with `DelegationNotFound` if none exists.
pub fn unregister_delegation(
    frame: &mut CallFrame<'_>,
    delegator: Address,
    delegatee: Address,
) -> Result<(), RegistryError> {
    if !has_delegation(frame.state(), delegator, delegatee)? {
        return Err(RegistryError::DelegationNotFound { delegator, delegatee });
    }
    delete_row(frame, &DELEGATIONS_TABLE, &[delegator.to_word(), delegatee.to_word()])?;
    tracing::info!(target: "registry", delegator = %delegator, delegatee = %delegatee, "unregistered delegation");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::initialize_world;
    use tessera_api::state::MemoryState;

    #[test]
    fn test_delegation_lifecycle() {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        initialize_world(&mut frame, Address::repeat_byte(0xAD)).unwrap();
        let alice = Address::repeat_byte(0xA1);
        let bob = Address::repeat_byte(0xB0);

        assert!(!has_delegation(frame.state(), alice, bob).unwrap());
        assert!(matches!(
            unregister_delegation(&mut frame, alice, bob),
            Err(RegistryError::DelegationNotFound { .. })
        ));
        register_delegation(&mut frame, alice, bob).unwrap();
        assert!(has_delegation(frame.state(), alice, bob).unwrap());
        assert!(!has_delegation(frame.state(), bob, alice).unwrap());
        unregister_delegation(&mut frame, alice, bob).unwrap();
        assert!(!has_delegation(frame.state(), alice, bob).unwrap());
    }
}
