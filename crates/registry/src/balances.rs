// Path: crates/registry/src/balances.rs

//! Value held by namespaces.

use crate::namespace::is_authorized;
use crate::tables::{malformed_row, read_row, write_row, BALANCES_TABLE};
use tessera_api::frame::CallFrame;
use tessera_api::state::StateAccess;
use tessera_types::error::RegistryError;
use tessera_types::schema::StaticValue;
use tessera_types::{Address, ResourceId};

/// Returns the balance of a namespace. Unknown namespaces hold zero.
pub fn balance_of(state: &dyn StateAccess, namespace: &ResourceId) -> Result<u128, RegistryError> {
    match read_row(state, &BALANCES_TABLE, &[namespace.to_word()])? {
        None => Ok(0),
        Some(values) => match values.as_slice() {
            [StaticValue::Uint(balance)] => Ok(*balance),
            _ => Err(malformed_row(&BALANCES_TABLE)),
        },
    }
}

fn write_balance(frame: &mut CallFrame<'_>, namespace: &ResourceId, balance: u128) -> Result<(), RegistryError> {
    write_row(
        frame,
        &BALANCES_TABLE,
        &[namespace.to_word()],
        &[StaticValue::Uint(balance)],
    )
}

/// Adds `amount` to a namespace's balance. A zero amount writes nothing.
pub fn credit_balance(
    frame: &mut CallFrame<'_>,
    namespace: &ResourceId,
    amount: u128,
) -> Result<(), RegistryError> {
    if amount == 0 {
        return Ok(());
    }
    let balance = balance_of(frame.state(), namespace)?
        .checked_add(amount)
        .ok_or(RegistryError::BalanceOverflow(*namespace))?;
    write_balance(frame, namespace, balance)?;
    tracing::debug!(target: "registry", namespace = %namespace, amount, balance, "credited balance");
    Ok(())
}

/// Moves `amount` from one namespace to another. `caller` must be authorized
/// on the debited namespace.
pub fn transfer_balance(
    frame: &mut CallFrame<'_>,
    caller: Address,
    from: &ResourceId,
    to: &ResourceId,
    amount: u128,
) -> Result<(), RegistryError> {
    if amount == 0 {
        return Ok(());
    }
    if !is_authorized(frame.state(), from, caller)? {
        return Err(RegistryError::AccessDenied {
            resource: *from,
            caller,
        });
    }
    let balance = balance_of(frame.state(), from)?;
    let remaining = balance
        .checked_sub(amount)
        .ok_or(RegistryError::InsufficientBalance {
            namespace: *from,
            balance,
            required: amount,
        })?;
    if from == to {
        return Ok(());
    }
    write_balance(frame, from, remaining)?;
    credit_balance(frame, to, amount)?;
    tracing::debug!(target: "registry", from = %from, to = %to, amount, "transferred balance");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{grant_access, register_namespace};
    use crate::tables::initialize_world;
    use tessera_api::state::MemoryState;

    const ADMIN: Address = Address::repeat_byte(0xAD);
    const OWNER: Address = Address::repeat_byte(0x01);
    const SPENDER: Address = Address::repeat_byte(0x02);

    #[test]
    fn test_credit_and_transfer() {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        initialize_world(&mut frame, ADMIN).unwrap();
        let app = ResourceId::namespace("app").unwrap();
        let vault = ResourceId::namespace("vault").unwrap();
        register_namespace(&mut frame, &app, OWNER).unwrap();
        register_namespace(&mut frame, &vault, OWNER).unwrap();

        assert_eq!(balance_of(frame.state(), &app).unwrap(), 0);
        credit_balance(&mut frame, &app, 100).unwrap();
        assert!(matches!(
            credit_balance(&mut frame, &app, u128::MAX),
            Err(RegistryError::BalanceOverflow(_))
        ));

        assert!(matches!(
            transfer_balance(&mut frame, SPENDER, &app, &vault, 10),
            Err(RegistryError::AccessDenied { .. })
        ));
        grant_access(&mut frame, OWNER, &app, SPENDER).unwrap();
        assert!(matches!(
            transfer_balance(&mut frame, SPENDER, &app, &vault, 101),
            Err(RegistryError::InsufficientBalance { balance: 100, required: 101, .. })
        ));
        transfer_balance(&mut frame, SPENDER, &app, &vault, 40).unwrap();
        assert_eq!(balance_of(frame.state(), &app).unwrap(), 60);
        assert_eq!(balance_of(frame.state(), &vault).unwrap(), 40);
    }

    #[test]
    fn test_zero_amounts_emit_nothing() {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        initialize_world(&mut frame, ADMIN).unwrap();
        let app = ResourceId::namespace("app").unwrap();
        let before = frame.events().len();
        credit_balance(&mut frame, &app, 0).unwrap();
        transfer_balance(&mut frame, SPENDER, &app, &app, 0).unwrap();
        assert_eq!(frame.events().len(), before);
    }
}
