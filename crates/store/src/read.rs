// Path: crates/store/src/read.rs

//! Record reads. Reads are unauthenticated: any caller may read any record.

use crate::primitives::load;
use crate::tables::resolve;
use tessera_api::state::StateAccess;
use tessera_types::codec::from_bytes_canonical;
use tessera_types::error::StoreError;
use tessera_types::keys::{parse_record_state_key, table_prefix};
use tessera_types::{Record, ResourceId, Word};

/// Reads a record. Offchain tables never hold records and always return `None`.
pub fn get_record(
    state: &dyn StateAccess,
    table: &ResourceId,
    key_tuple: &[Word],
) -> Result<Option<Record>, StoreError> {
    let resolved = resolve(state, table)?;
    resolved.check_key(key_tuple)?;
    if resolved.offchain {
        return Ok(None);
    }
    load(state, table, key_tuple)
}

/// Lists every record of a table in key order.
pub fn scan_table(state: &dyn StateAccess, table: &ResourceId) -> Result<Vec<(Vec<Word>, Record)>, StoreError> {
    let resolved = resolve(state, table)?;
    if resolved.offchain {
        return Ok(Vec::new());
    }
    let mut rows = Vec::new();
    for entry in state.prefix_scan(&table_prefix(table))? {
        let (key, value) = entry?;
        let record_key = parse_record_state_key(&key)
            .ok_or_else(|| StoreError::Decode(format!("malformed record key under {}", table)))?;
        let record = from_bytes_canonical::<Record>(&value).map_err(StoreError::Decode)?;
        rows.push((record_key.key_tuple, record));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{delete_record, set_record};
    use crate::tables::{register_store_tables, register_table, TableDefinition};
    use tessera_api::frame::CallFrame;
    use tessera_api::state::MemoryState;
    use tessera_types::schema::StaticType;
    use tessera_types::{EncodedLengths, ResourceType, Schema};

    #[test]
    fn test_scan_table_lists_only_its_rows() {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        register_store_tables(&mut frame).unwrap();
        let def = TableDefinition::new(
            Schema::static_only(vec![StaticType::Uint(1)]).unwrap(),
            Schema::static_only(vec![StaticType::Uint(1)]).unwrap(),
        );
        let a = ResourceId::new(ResourceType::Table, "app", "A").unwrap();
        let b = ResourceId::new(ResourceType::Table, "app", "B").unwrap();
        register_table(&mut frame, &a, &def).unwrap();
        register_table(&mut frame, &b, &def).unwrap();

        for n in [3u8, 1, 2] {
            set_record(&mut frame, &a, &[[n; 32]], &[n], EncodedLengths::empty(), &[]).unwrap();
        }
        set_record(&mut frame, &b, &[[9; 32]], &[9], EncodedLengths::empty(), &[]).unwrap();
        delete_record(&mut frame, &a, &[[2; 32]]).unwrap();

        let rows = scan_table(frame.state(), &a).unwrap();
        let keys: Vec<Word> = rows.iter().map(|(k, _)| k[0]).collect();
        assert_eq!(keys, vec![[1; 32], [3; 32]]);
        assert_eq!(rows[1].1.static_data, vec![3]);
        assert_eq!(scan_table(frame.state(), &b).unwrap().len(), 1);
    }
}
