// Path: crates/types/src/keys/mod.rs
//! Defines the key layout of persisted records.
//!
//! Every record lives under `RECORD_KEY_PREFIX | table (32) | atom count (1) |
//! atoms (32 each)`. Keeping the table directly after the prefix lets a
//! prefix scan enumerate one table.

use crate::record::RecordKey;
use crate::resource::{ResourceId, Word};

/// The state key prefix for all records.
pub const RECORD_KEY_PREFIX: &[u8] = b"store::record::";

/// The state key prefix of every record in `table`.
pub fn table_prefix(table: &ResourceId) -> Vec<u8> {
    [RECORD_KEY_PREFIX, &table.0].concat()
}

/// The state key of one record.
pub fn record_state_key(table: &ResourceId, key_tuple: &[Word]) -> Vec<u8> {
    let mut key = Vec::with_capacity(RECORD_KEY_PREFIX.len() + 33 + 32 * key_tuple.len());
    key.extend_from_slice(RECORD_KEY_PREFIX);
    key.extend_from_slice(&table.0);
    key.push(key_tuple.len() as u8);
    for atom in key_tuple {
        key.extend_from_slice(atom);
    }
    key
}

/// Recovers the record key from a state key written by `record_state_key`.
pub fn parse_record_state_key(key: &[u8]) -> Option<RecordKey> {
    let rest = key.strip_prefix(RECORD_KEY_PREFIX)?;
    let (table, rest) = rest.split_first_chunk::<32>()?;
    let (count, atoms) = rest.split_first()?;
    if atoms.len() != usize::from(*count) * 32 {
        return None;
    }
    let key_tuple = atoms
        .chunks_exact(32)
        .map(|chunk| {
            let mut atom = [0u8; 32];
            atom.copy_from_slice(chunk);
            atom
        })
        .collect();
    Some(RecordKey::new(ResourceId(*table), key_tuple))
}
